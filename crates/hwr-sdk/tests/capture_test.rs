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

use std::sync::Arc;

use hwr_core::surface::ColorSpace;
use hwr_core::CaptureError;
use hwr_sdk::prelude::*;

fn thread() -> Arc<RenderThread> {
    software_render_thread(RenderThreadConfig::default()).expect("render thread should start")
}

fn square(color: u32) -> Arc<dyn RenderNode> {
    let mut list = DisplayList::new();
    list.push(DrawOp::FillRect {
        rect: Rect::new(0, 0, 2, 2),
        color,
    });
    RecordedNode::with_display_list("square", list)
}

#[test]
fn test_capture_rejects_empty_dimensions() {
    let thread = thread();

    for (w, h) in [(0, 10), (10, 0), (-1, 4)] {
        let result = create_hardware_bitmap(&thread, square(1), w, h);
        assert_eq!(
            result,
            Err(CaptureError::InvalidDimensions {
                width: w,
                height: h
            })
        );
    }
}

#[test]
fn test_capture_returns_a_full_buffer() {
    let thread = thread();

    let bitmap = create_hardware_bitmap(&thread, square(0xff11_2233), 4, 3)
        .expect("capture should succeed");

    assert_eq!((bitmap.width, bitmap.height), (4, 3));
    assert_eq!(bitmap.pixels.len(), 12);
    assert_eq!(bitmap.pixel(1, 1), Some(0xff11_2233));
    // The capture context is translucent, so uncovered pixels stay clear.
    assert_eq!(bitmap.pixel(3, 2), Some(0));
    assert_eq!(bitmap.color_space, Some(ColorSpace::Srgb));
}

#[test]
fn test_capture_does_not_disturb_other_proxies() {
    let thread = thread();
    let root = RootScene::new("window", Box::new(LogErrorReporter::new()));
    let proxy = RenderProxy::new(thread.clone(), false, root).unwrap();

    create_hardware_bitmap(&thread, square(7), 2, 2).unwrap();

    assert_eq!(proxy.context_state(), ContextState::Uninitialized);
}

#[test]
fn test_copy_surface_into_scales_the_last_frame() {
    let thread = thread();
    let root = RootScene::new("window", Box::new(LogErrorReporter::new()));
    let proxy = RenderProxy::new(thread.clone(), false, root).unwrap();
    let (surface, _consumer) = BufferQueue::create("window", 4, 4, 2);
    let surface: Arc<dyn PresentationSurface> = surface;

    let mut bitmap = PixelBuffer::new(2, 2);
    assert_eq!(
        copy_surface_into(&thread, &surface, None, &mut bitmap),
        CopyResult::SourceEmpty
    );

    proxy.set_surface(Some(surface.clone()));
    proxy.draw_render_node(square(0xffab_cdef));

    assert_eq!(
        copy_surface_into(&thread, &surface, Some(Rect::new(0, 0, 2, 2)), &mut bitmap),
        CopyResult::Success
    );
    assert_eq!(bitmap.pixels, vec![0xffab_cdef; 4]);
    assert_eq!(bitmap.color_space, Some(ColorSpace::Srgb));

    assert_eq!(
        copy_surface_into(&thread, &surface, Some(Rect::new(2, 2, 8, 8)), &mut bitmap),
        CopyResult::SourceInvalid
    );
    let mut empty = PixelBuffer::new(0, 0);
    assert_eq!(
        copy_surface_into(&thread, &surface, None, &mut empty),
        CopyResult::DestinationInvalid
    );
}

#[test]
fn test_copy_surface_into_rejects_malformed_destination() {
    let thread = thread();
    let (surface, _consumer) = BufferQueue::create("window", 4, 4, 2);
    let surface: Arc<dyn PresentationSurface> = surface;

    // ARRANGE
    let mut short = PixelBuffer {
        width: 2,
        height: 2,
        pixels: vec![0; 3],
        color_space: None,
    };
    let mut huge = PixelBuffer {
        width: u32::MAX,
        height: 2,
        pixels: vec![0; 4],
        color_space: None,
    };

    // ACT / ASSERT
    assert_eq!(
        copy_surface_into(&thread, &surface, None, &mut short),
        CopyResult::DestinationInvalid
    );
    assert_eq!(
        copy_surface_into(&thread, &surface, None, &mut huge),
        CopyResult::DestinationInvalid
    );
    assert!(thread.is_running());
}
