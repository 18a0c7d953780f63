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

//! The fixed-size frame timing record.

use std::time::Duration;

/// Index of each timestamp slot in a [`FrameInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum FrameInfoIndex {
    /// Raw [`FrameInfoFlags`] bits.
    Flags = 0,
    /// The vsync the frame was intended for.
    IntendedVsync,
    /// The vsync actually used for animation.
    Vsync,
    /// Timestamp of the oldest input event handled by the frame.
    OldestInputEvent,
    /// Timestamp of the newest input event handled by the frame.
    NewestInputEvent,
    /// Start of input handling.
    HandleInputStart,
    /// Start of caller-side animations.
    AnimationStart,
    /// Start of measure/layout.
    PerformTraversalsStart,
    /// Start of display-list recording.
    DrawStart,
    // Everything below is filled on the render thread.
    /// The caller queued the sync.
    SyncQueued,
    /// The render thread started the sync phase.
    SyncStart,
    /// The render thread started issuing draw commands.
    IssueDrawCommandsStart,
    /// The frame was handed to the surface.
    SwapBuffers,
    /// The frame completed.
    FrameCompleted,
}

impl FrameInfoIndex {
    /// Number of slots in a full record.
    pub const COUNT: usize = FrameInfoIndex::FrameCompleted as usize + 1;
}

/// Number of leading slots supplied by the caller thread.
///
/// A record of any other length handed to a sync-and-draw is a fatal
/// configuration error.
pub const UI_THREAD_FRAME_INFO_SIZE: usize = FrameInfoIndex::SyncQueued as usize;

/// Flags stored in the [`FrameInfoIndex::Flags`] slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameInfoFlags {
    bits: i64,
}

impl FrameInfoFlags {
    /// No flags.
    pub const NONE: Self = Self { bits: 0 };
    /// The window layout changed during this frame.
    pub const WINDOW_LAYOUT_CHANGED: Self = Self { bits: 1 << 0 };
    /// The frame was produced by the render thread alone.
    pub const RT_ANIMATION: Self = Self { bits: 1 << 1 };
    /// The frame renders into an off-screen surface canvas.
    pub const SURFACE_CANVAS: Self = Self { bits: 1 << 2 };
    /// The frame was skipped and nothing was presented.
    pub const SKIPPED_FRAME: Self = Self { bits: 1 << 3 };

    /// Creates flags from raw bits.
    pub const fn from_bits(bits: i64) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> i64 {
        self.bits
    }

    /// Checks whether all bits of `other` are set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl std::ops::BitOr for FrameInfoFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits | rhs.bits)
    }
}

impl std::ops::BitOrAssign for FrameInfoFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

/// A full per-frame timing record, in nanoseconds of the monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    slots: [i64; FrameInfoIndex::COUNT],
}

impl FrameInfo {
    /// Creates a zeroed record.
    pub fn new() -> Self {
        Self {
            slots: [0; FrameInfoIndex::COUNT],
        }
    }

    /// Copies the caller-supplied prefix into this record and clears the
    /// render-thread part.
    pub fn import_ui_thread_info(&mut self, info: &[i64; UI_THREAD_FRAME_INFO_SIZE]) {
        self.slots[..UI_THREAD_FRAME_INFO_SIZE].copy_from_slice(info);
        for slot in &mut self.slots[UI_THREAD_FRAME_INFO_SIZE..] {
            *slot = 0;
        }
    }

    /// Reads one slot.
    pub fn get(&self, index: FrameInfoIndex) -> i64 {
        self.slots[index as usize]
    }

    /// Writes one slot.
    pub fn set(&mut self, index: FrameInfoIndex, value: i64) {
        self.slots[index as usize] = value;
    }

    /// Stores the current monotonic time in `index`.
    pub fn mark(&mut self, index: FrameInfoIndex) {
        self.set(index, crate::time::now_nanos());
    }

    /// Returns the flags slot.
    pub fn flags(&self) -> FrameInfoFlags {
        FrameInfoFlags::from_bits(self.get(FrameInfoIndex::Flags))
    }

    /// Adds flags to the flags slot.
    pub fn add_flag(&mut self, flag: FrameInfoFlags) {
        let flags = self.flags() | flag;
        self.set(FrameInfoIndex::Flags, flags.bits());
    }

    /// Elapsed time between two slots, clamped at zero when either is unset
    /// or the order is inverted.
    pub fn duration(&self, start: FrameInfoIndex, end: FrameInfoIndex) -> Duration {
        let (start, end) = (self.get(start), self.get(end));
        if start <= 0 || end <= start {
            return Duration::ZERO;
        }
        Duration::from_nanos((end - start) as u64)
    }

    /// Duration from the intended vsync to frame completion.
    pub fn total_duration(&self) -> Duration {
        self.duration(FrameInfoIndex::IntendedVsync, FrameInfoIndex::FrameCompleted)
    }

    /// The raw slots.
    pub fn as_slice(&self) -> &[i64] {
        &self.slots
    }
}

impl Default for FrameInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the caller-supplied prefix of a frame-info record.
#[derive(Debug, Clone, Copy, Default)]
pub struct UiFrameInfoBuilder {
    slots: [i64; UI_THREAD_FRAME_INFO_SIZE],
}

impl UiFrameInfoBuilder {
    /// Creates a zeroed builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the vsync slots. Input timestamps default to the intended vsync.
    pub fn set_vsync(mut self, vsync_nanos: i64, intended_vsync_nanos: i64) -> Self {
        self.slots[FrameInfoIndex::Vsync as usize] = vsync_nanos;
        self.slots[FrameInfoIndex::IntendedVsync as usize] = intended_vsync_nanos;
        self.slots[FrameInfoIndex::OldestInputEvent as usize] = intended_vsync_nanos;
        self.slots[FrameInfoIndex::NewestInputEvent as usize] = intended_vsync_nanos;
        self
    }

    /// Sets one caller-side slot.
    pub fn set(mut self, index: FrameInfoIndex, value: i64) -> Self {
        let i = index as usize;
        if i < UI_THREAD_FRAME_INFO_SIZE {
            self.slots[i] = value;
        } else {
            log::warn!("Ignoring render-thread slot {index:?} in UiFrameInfoBuilder");
        }
        self
    }

    /// Adds a flag.
    pub fn add_flag(mut self, flag: FrameInfoFlags) -> Self {
        self.slots[FrameInfoIndex::Flags as usize] |= flag.bits();
        self
    }

    /// Returns the finished prefix.
    pub fn build(self) -> [i64; UI_THREAD_FRAME_INFO_SIZE] {
        self.slots
    }
}
