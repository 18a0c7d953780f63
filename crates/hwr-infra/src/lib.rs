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

//! # HWR Infra
//!
//! Concrete collaborators for the render thread:
//!
//! - [`software`]: a CPU rasterizer implementing the graphics backend.
//! - [`buffer_queue`]: an in-process producer/consumer buffer queue.
//! - [`properties`], [`shader_cache`], [`reporter`], [`runtime`]: the small
//!   process-wide services.

pub mod buffer_queue;
pub mod properties;
pub mod reporter;
pub mod runtime;
pub mod shader_cache;
pub mod software;

pub use buffer_queue::{BufferQueue, QueueConsumer, QueueSurface};
pub use properties::InMemoryProperties;
pub use reporter::LogErrorReporter;
pub use runtime::NativeCallerRuntime;
pub use shader_cache::DiskShaderCache;
pub use software::{SoftwareBackend, SoftwareContext};
