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

//! Off-screen snapshots and surface read-back.

use std::sync::Arc;

use hwr_control::RenderThread;
use hwr_core::math::Rect;
use hwr_core::scene::{RenderNode, SwapBehavior};
use hwr_core::surface::{BufferConsumer, ColorSpace, CopyResult, PixelBuffer, PresentationSurface};
use hwr_core::CaptureError;
use hwr_data::RootScene;
use hwr_infra::software::raster;
use hwr_infra::{BufferQueue, LogErrorReporter};

use crate::proxy::RenderProxy;

const CAPTURE_MAX_BUFFERS: usize = 2;

/// Renders `node` into a new pixel buffer of `width` x `height`.
///
/// The node is drawn by a temporary proxy into a private buffer queue, with
/// shadows disabled and the buffer discarded between frames. Either a fully
/// drawn buffer comes back or an error does.
pub fn create_hardware_bitmap(
    thread: &Arc<RenderThread>,
    node: Arc<dyn RenderNode>,
    width: i32,
    height: i32,
) -> Result<PixelBuffer, CaptureError> {
    if width <= 0 || height <= 0 {
        log::error!("Invalid width {width} or height {height}");
        return Err(CaptureError::InvalidDimensions { width, height });
    }
    let (surface, consumer) =
        BufferQueue::create("capture", width as u32, height as u32, CAPTURE_MAX_BUFFERS);

    let root = RootScene::new(
        format!("capture-{}", node.name()),
        Box::new(LogErrorReporter::new()),
    );
    let proxy = RenderProxy::new(thread.clone(), true, root)
        .map_err(|e| CaptureError::Setup(e.to_string()))?;
    proxy.set_swap_behavior(SwapBehavior::DiscardBuffer);
    proxy.set_light_alpha(0.0, 0.0);
    proxy.set_surface(Some(surface as Arc<dyn PresentationSurface>));
    let result = proxy.draw_render_node(node);
    proxy.destroy();
    log::trace!("Capture draw finished with {result:?}");

    let item = consumer.acquire_buffer().map_err(|e| {
        log::warn!("Failed to acquire buffer: {e}");
        CaptureError::AcquireFailed(e)
    })?;
    let Some(mut buffer) = item.buffer.clone() else {
        log::warn!("Acquired buffer item has no graphic buffer");
        release(consumer.as_ref(), item);
        return Err(CaptureError::NullBuffer);
    };
    if buffer.width != width as u32 || buffer.height != height as u32 {
        log::warn!(
            "Size mismatch, expected {width}x{height} got {}x{}",
            buffer.width,
            buffer.height
        );
    }
    buffer.color_space.get_or_insert(ColorSpace::Srgb);
    release(consumer.as_ref(), item);
    Ok(buffer)
}

// The buffer was acquired for inspection only.
fn release(consumer: &dyn BufferConsumer, item: hwr_core::surface::BufferItem) {
    if let Err(e) = consumer.release_buffer(item) {
        log::debug!("Capture buffer release failed: {e}");
    }
}

/// Copies the last frame presented to `surface` into `bitmap`, scaled with
/// nearest-neighbour sampling. `src_rect` defaults to the whole frame.
pub fn copy_surface_into(
    thread: &Arc<RenderThread>,
    surface: &Arc<dyn PresentationSurface>,
    src_rect: Option<Rect>,
    bitmap: &mut PixelBuffer,
) -> CopyResult {
    if bitmap.is_empty() || !bitmap.is_consistent() {
        return CopyResult::DestinationInvalid;
    }
    if !thread.is_running() {
        return CopyResult::UnknownError;
    }
    let surface = surface.clone();
    let mut target = bitmap.clone();
    let (result, target) = thread.post_and_wait(move |_| {
        let Some(frame) = surface.read_back() else {
            return (CopyResult::SourceEmpty, target);
        };
        let rect = src_rect.unwrap_or(Rect::from_size(frame.width, frame.height));
        if !raster::scale_nearest(&frame, rect, &mut target) {
            return (CopyResult::SourceInvalid, target);
        }
        target.color_space = Some(frame.color_space.unwrap_or_default());
        (CopyResult::Success, target)
    });
    if result == CopyResult::Success {
        *bitmap = target;
    }
    result
}
