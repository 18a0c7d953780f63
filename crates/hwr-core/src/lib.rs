// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # HWR Core
//!
//! Foundational crate containing the contracts and plain data types shared by
//! the caller-facing proxy and the render thread.
//!
//! Nothing in here owns a thread. The traits describe the narrow interfaces of
//! the external collaborators (graphics backend, presentation surface, buffer
//! queues, properties store, shader caches, caller runtime) so that the
//! runtime crates can be driven by real or stub implementations alike.

#![warn(missing_docs)]

pub mod backend;
pub mod callback;
pub mod error;
pub mod frame;
pub mod handle;
pub mod math;
pub mod properties;
pub mod runtime;
pub mod scene;
pub mod surface;
pub mod time;

#[doc(hidden)]
pub use log;

pub use error::{AttachError, BufferError, CaptureError, ErrorReporter, RenderError};
pub use frame::{
    DrawOutcome, FrameInfo, FrameInfoFlags, FrameInfoIndex, SyncResult, UiFrameInfoBuilder,
    UI_THREAD_FRAME_INFO_SIZE,
};
pub use handle::{Handle, HandleArena};
