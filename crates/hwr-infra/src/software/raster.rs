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

//! Pixel operations of the software backend.

use hwr_core::math::Rect;
use hwr_core::scene::{DrawOp, SceneSnapshot};
use hwr_core::surface::PixelBuffer;

/// Opaque black, the background of an opaque surface.
pub const OPAQUE_BLACK: u32 = 0xff00_0000;

/// Replays every node of `snapshot` into `target`, clipped to the content
/// bounds when set.
pub fn rasterize(target: &mut PixelBuffer, snapshot: &SceneSnapshot) {
    let full = Rect::from_size(target.width, target.height);
    let clip = match snapshot.settings.content_bounds {
        Some(bounds) => match bounds.intersect(&full) {
            Some(clip) => clip,
            None => return,
        },
        None => full,
    };
    let force_dark = snapshot.settings.force_dark;

    for node in &snapshot.nodes {
        for op in &node.display_list.ops {
            match *op {
                DrawOp::Clear(color) => fill_rect(target, clip, adjust(color, force_dark)),
                DrawOp::FillRect { rect, color } => {
                    if let Some(area) = rect.intersect(&clip) {
                        fill_rect(target, area, adjust(color, force_dark));
                    }
                }
            }
        }
    }
}

/// Fills `area`, which must lie inside `target`.
pub fn fill_rect(target: &mut PixelBuffer, area: Rect, color: u32) {
    let width = target.width as usize;
    for y in area.top..area.bottom {
        let row = y as usize * width;
        target.pixels[row + area.left as usize..row + area.right as usize].fill(color);
    }
}

/// Scales `src_rect` of `src` onto the whole of `dst` with nearest-neighbour
/// sampling. Returns `false` when `src_rect` does not fit in `src`.
pub fn scale_nearest(src: &PixelBuffer, src_rect: Rect, dst: &mut PixelBuffer) -> bool {
    let bounds = Rect::from_size(src.width, src.height);
    if src_rect.is_empty() || src_rect.intersect(&bounds) != Some(src_rect) {
        return false;
    }
    let (sw, sh) = (src_rect.width() as u64, src_rect.height() as u64);
    let (dw, dh) = (dst.width as u64, dst.height as u64);
    for y in 0..dh {
        let sy = src_rect.top as u64 + y * sh / dh;
        for x in 0..dw {
            let sx = src_rect.left as u64 + x * sw / dw;
            dst.pixels[(y * dw + x) as usize] = src.pixels[(sy * src.width as u64 + sx) as usize];
        }
    }
    true
}

// Force dark inverts the color channels and keeps alpha.
fn adjust(color: u32, force_dark: bool) -> u32 {
    if force_dark {
        color ^ 0x00ff_ffff
    } else {
        color
    }
}
