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

/// Bit flags returned to the caller by a sync-and-draw.
///
/// An empty set means the frame was handled and no further redraw is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SyncResult {
    bits: u32,
}

impl SyncResult {
    /// Nothing to report.
    pub const OK: Self = Self { bits: 0 };
    /// Animations are still running; the caller should schedule another frame.
    pub const REDRAW_REQUIRED: Self = Self { bits: 1 << 0 };
    /// No usable surface is bound. The caller must manage buffers itself
    /// until one is provided.
    pub const LOST_SURFACE_REWARD_IF_FOUND: Self = Self { bits: 1 << 1 };
    /// The context is stopped; drawing was suppressed.
    pub const CONTEXT_STOPPED: Self = Self { bits: 1 << 2 };
    /// The frame was not presented.
    pub const FRAME_DROPPED: Self = Self { bits: 1 << 3 };

    /// Creates a result from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Checks whether all bits of `other` are set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Returns `true` when no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for SyncResult {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits | rhs.bits)
    }
}

impl std::ops::BitOrAssign for SyncResult {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

/// What the graphics backend did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// The frame reached the presentation surface.
    Presented,
    /// Nothing was presented (no surface, nothing to draw).
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine() {
        let mut result = SyncResult::OK;
        assert!(result.is_empty());
        result |= SyncResult::CONTEXT_STOPPED;
        result |= SyncResult::FRAME_DROPPED;
        assert!(result.contains(SyncResult::CONTEXT_STOPPED | SyncResult::FRAME_DROPPED));
        assert!(!result.contains(SyncResult::REDRAW_REQUIRED));
        assert_eq!(result.bits(), 0b1100);
    }
}
