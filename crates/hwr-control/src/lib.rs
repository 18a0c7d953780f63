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

//! # HWR Control
//!
//! The render thread and the state it owns.
//!
//! - [`RenderThread`]: the single worker thread, its task queue and the
//!   process-wide operations.
//! - [`RenderContext`]: the per-proxy frame pipeline (sync then draw).
//! - [`CallbackRegistry`]: listener slots of one context.

#![warn(missing_docs)]

pub mod callbacks;
pub mod config;
pub mod context;
pub mod scheduler;
pub mod thread;

pub use callbacks::CallbackRegistry;
pub use config::RenderThreadConfig;
pub use context::{ContextId, RenderContext};
pub use thread::{RenderThread, WorkerServices, WorkerState};
