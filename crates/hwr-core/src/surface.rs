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

//! Presentation targets and the producer/consumer buffer contract.

use crate::error::BufferError;

/// The color space a buffer was rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    /// Standard sRGB.
    #[default]
    Srgb,
    /// Display P3, used for wide-gamut content.
    DisplayP3,
}

/// A CPU-visible RGBA8 pixel buffer, one packed ARGB `u32` per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major pixels.
    pub pixels: Vec<u32>,
    /// The color space, if the producer reported one.
    pub color_space: Option<ColorSpace>,
}

impl PixelBuffer {
    /// Creates a zeroed buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            color_space: None,
        }
    }

    /// Reads one pixel, `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Fills every pixel with `color`.
    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// The raw bytes of the pixel data.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Returns `true` if the buffer holds no pixel.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if `pixels` holds exactly `width * height` entries.
    pub fn is_consistent(&self) -> bool {
        u64::from(self.width)
            .checked_mul(u64::from(self.height))
            .is_some_and(|count| count == self.pixels.len() as u64)
    }
}

/// A buffer moving through a buffer queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferItem {
    /// The queue slot holding the buffer.
    pub slot: usize,
    /// Frame number assigned when the buffer was queued.
    pub frame_number: u64,
    /// The buffer itself. A consumer may observe an item without one.
    pub buffer: Option<PixelBuffer>,
}

/// The producer side of a presentation target.
///
/// A surface is bound to at most one context at a time. Once bound, only the
/// render thread touches it.
pub trait PresentationSurface: Send + Sync {
    /// A debug name.
    fn name(&self) -> &str;

    /// Size of the buffers produced for this surface.
    fn size(&self) -> (u32, u32);

    /// Connects a producer. Fails if another producer is connected.
    fn connect(&self) -> Result<(), BufferError>;

    /// Disconnects the producer. Buffers dequeued and not queued are dropped.
    fn disconnect(&self);

    /// Obtains a buffer to render into.
    fn dequeue_buffer(&self) -> Result<BufferItem, BufferError>;

    /// Hands a rendered buffer to the consumer side.
    fn queue_buffer(&self, item: BufferItem) -> Result<(), BufferError>;

    /// Pre-allocates backing buffers.
    fn allocate_buffers(&self) {}

    /// Returns a copy of the last presented content, if the surface keeps one.
    fn read_back(&self) -> Option<PixelBuffer> {
        None
    }
}

/// The consumer side of a buffer queue.
pub trait BufferConsumer: Send + Sync {
    /// Takes the oldest queued buffer.
    fn acquire_buffer(&self) -> Result<BufferItem, BufferError>;

    /// Returns an acquired buffer to the queue.
    fn release_buffer(&self, item: BufferItem) -> Result<(), BufferError>;

    /// The fixed number of buffers of the queue.
    fn max_buffer_count(&self) -> usize;
}

/// Outcome of copying a surface into a caller-provided bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyResult {
    /// The destination holds the source content.
    Success,
    /// Something went wrong on the render thread.
    UnknownError,
    /// The source has never presented anything.
    SourceEmpty,
    /// The source rectangle lies outside the surface.
    SourceInvalid,
    /// The destination bitmap cannot receive pixels.
    DestinationInvalid,
}
