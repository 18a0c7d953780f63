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

//! The public-facing API of the threaded renderer.
//!
//! A caller builds one [`RenderThread`](hwr_control::RenderThread) per
//! process (see [`software_render_thread`]), then one [`RenderProxy`] per
//! render target. Every proxy operation is either posted to the render
//! thread or, when the caller needs a value back, waits for it.

mod capture;
mod proxy;

pub use capture::{copy_surface_into, create_hardware_bitmap};
pub use hwr_telemetry::logging::init as init_logging;
pub use proxy::RenderProxy;

use std::sync::Arc;

use anyhow::{Context, Result};
use hwr_control::{RenderThread, RenderThreadConfig, WorkerServices};
use hwr_infra::{DiskShaderCache, InMemoryProperties, NativeCallerRuntime, SoftwareBackend};

pub mod prelude {
    pub use crate::{copy_surface_into, create_hardware_bitmap, software_render_thread, RenderProxy};
    pub use hwr_control::{RenderThread, RenderThreadConfig};
    pub use hwr_core::backend::TrimLevel;
    pub use hwr_core::math::{Rect, Vec3};
    pub use hwr_core::scene::{
        ContextState, DisplayList, DrawOp, NodeId, Placement, RenderNode, SwapBehavior,
    };
    pub use hwr_core::surface::{CopyResult, PixelBuffer, PresentationSurface};
    pub use hwr_core::time::now_nanos;
    pub use hwr_core::{SyncResult, UiFrameInfoBuilder, UI_THREAD_FRAME_INFO_SIZE};
    pub use hwr_data::{RecordedNode, RootScene};
    pub use hwr_infra::{BufferQueue, LogErrorReporter};
    pub use hwr_telemetry::DumpFlags;
}

/// Starts a render thread drawing with the software backend.
pub fn software_render_thread(config: RenderThreadConfig) -> Result<Arc<RenderThread>> {
    let services = WorkerServices {
        backend: Box::new(SoftwareBackend::new()),
        caller_runtime: Arc::new(NativeCallerRuntime::new()),
        properties: Arc::new(InMemoryProperties::new()),
        program_cache: Arc::new(DiskShaderCache::new("Program")),
        pipeline_cache: Arc::new(DiskShaderCache::new("Pipeline")),
    };
    let thread = RenderThread::new(config, services);
    thread.start().context("Failed to spawn the render thread")?;
    Ok(thread)
}
