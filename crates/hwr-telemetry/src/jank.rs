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

//! Jank accounting over completed frames.

use std::fmt::Write;
use std::time::{Duration, Instant};

use hwr_core::{FrameInfo, FrameInfoFlags};
use serde::Serialize;

/// Frame durations are bucketed per millisecond up to this bound; longer
/// frames land in the last bucket.
const HISTOGRAM_BUCKETS: usize = 150;

/// Selects what a profile dump contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DumpFlags {
    bits: u32,
}

impl DumpFlags {
    /// Totals and percentiles.
    pub const FRAME_STATS: Self = Self { bits: 1 << 0 };
    /// Clear the statistics after dumping.
    pub const RESET: Self = Self { bits: 1 << 1 };
    /// The full duration histogram.
    pub const JANK_STATS: Self = Self { bits: 1 << 2 };
    /// A trailing JSON line with the summary.
    pub const JSON: Self = Self { bits: 1 << 3 };

    /// Creates flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Checks whether all bits of `other` are set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl std::ops::BitOr for DumpFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits | rhs.bits)
    }
}

/// A serializable view of the tracked statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JankSummary {
    /// Frames recorded since the last reset.
    pub total_frames: u64,
    /// Frames that took longer than one frame interval.
    pub janky_frames: u64,
    /// Frames skipped without presenting.
    pub skipped_frames: u64,
    /// 50th percentile of frame durations, in milliseconds.
    pub p50_ms: u32,
    /// 90th percentile.
    pub p90_ms: u32,
    /// 95th percentile.
    pub p95_ms: u32,
    /// 99th percentile.
    pub p99_ms: u32,
    /// Seconds since the last reset.
    pub since_secs: f64,
}

/// Accumulates frame durations and counts frames that missed their deadline.
#[derive(Debug, Clone)]
pub struct JankTracker {
    frame_interval: Duration,
    total_frames: u64,
    janky_frames: u64,
    skipped_frames: u64,
    histogram: Vec<u32>,
    since: Instant,
}

impl JankTracker {
    /// Creates a tracker for a display refreshing every `frame_interval`.
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            total_frames: 0,
            janky_frames: 0,
            skipped_frames: 0,
            histogram: vec![0; HISTOGRAM_BUCKETS],
            since: Instant::now(),
        }
    }

    /// Updates the refresh interval used for jank classification.
    pub fn set_frame_interval(&mut self, frame_interval: Duration) {
        self.frame_interval = frame_interval;
    }

    /// Records one completed (or skipped) frame.
    pub fn add_frame(&mut self, info: &FrameInfo) {
        self.total_frames += 1;
        if info.flags().contains(FrameInfoFlags::SKIPPED_FRAME) {
            self.skipped_frames += 1;
            return;
        }
        let duration = info.total_duration();
        if duration > self.frame_interval {
            self.janky_frames += 1;
        }
        let bucket = (duration.as_millis() as usize).min(HISTOGRAM_BUCKETS - 1);
        self.histogram[bucket] += 1;
    }

    /// Frames recorded since the last reset.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Frames that missed their deadline since the last reset.
    pub fn janky_frames(&self) -> u64 {
        self.janky_frames
    }

    /// Duration, in whole milliseconds, under which `percentile` percent of
    /// the drawn frames completed.
    pub fn percentile(&self, percentile: u32) -> u32 {
        let drawn: u64 = self.histogram.iter().map(|&c| c as u64).sum();
        if drawn == 0 {
            return 0;
        }
        let target = (drawn * percentile.min(100) as u64).div_ceil(100).max(1);
        let mut seen = 0u64;
        for (ms, &count) in self.histogram.iter().enumerate() {
            seen += count as u64;
            if seen >= target {
                return ms as u32;
            }
        }
        (HISTOGRAM_BUCKETS - 1) as u32
    }

    /// Clears every statistic.
    pub fn reset(&mut self) {
        self.total_frames = 0;
        self.janky_frames = 0;
        self.skipped_frames = 0;
        self.histogram.iter_mut().for_each(|c| *c = 0);
        self.since = Instant::now();
    }

    /// Returns the current statistics.
    pub fn summary(&self) -> JankSummary {
        JankSummary {
            total_frames: self.total_frames,
            janky_frames: self.janky_frames,
            skipped_frames: self.skipped_frames,
            p50_ms: self.percentile(50),
            p90_ms: self.percentile(90),
            p95_ms: self.percentile(95),
            p99_ms: self.percentile(99),
            since_secs: self.since.elapsed().as_secs_f64(),
        }
    }

    /// Formats the statistics under `name`.
    pub fn dump(&self, name: &str, flags: DumpFlags) -> String {
        let s = self.summary();
        let mut out = String::new();
        let _ = writeln!(out, "Stats for '{name}' since {:.1}s:", s.since_secs);
        if flags.contains(DumpFlags::FRAME_STATS) {
            let janky_pct = if s.total_frames > 0 {
                s.janky_frames as f64 * 100.0 / s.total_frames as f64
            } else {
                0.0
            };
            let _ = writeln!(out, "Total frames rendered: {}", s.total_frames);
            let _ = writeln!(
                out,
                "Janky frames: {} ({janky_pct:.2}%)",
                s.janky_frames
            );
            let _ = writeln!(out, "Skipped frames: {}", s.skipped_frames);
            let _ = writeln!(out, "50th percentile: {}ms", s.p50_ms);
            let _ = writeln!(out, "90th percentile: {}ms", s.p90_ms);
            let _ = writeln!(out, "95th percentile: {}ms", s.p95_ms);
            let _ = writeln!(out, "99th percentile: {}ms", s.p99_ms);
        }
        if flags.contains(DumpFlags::JANK_STATS) {
            out.push_str("HISTOGRAM:");
            for (ms, &count) in self.histogram.iter().enumerate() {
                if count > 0 {
                    let _ = write!(out, " {ms}ms={count}");
                }
            }
            out.push('\n');
        }
        if flags.contains(DumpFlags::JSON) {
            match self.to_json() {
                Ok(json) => {
                    out.push_str(&json);
                    out.push('\n');
                }
                Err(e) => log::warn!("Failed to serialize stats for '{name}': {e}"),
            }
        }
        out
    }

    /// Serializes the current statistics as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.summary())
    }
}

impl Default for JankTracker {
    fn default() -> Self {
        Self::new(Duration::from_nanos(16_666_667))
    }
}
