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

//! Pacing of render-thread frames on a simulated vsync.

use std::time::{Duration, Instant};

/// Targets waiting for the next vsync tick, in request order.
#[derive(Debug)]
pub struct FrameScheduler<K> {
    interval: Duration,
    last_vsync: Instant,
    vsync_enabled: bool,
    waiting: Vec<K>,
}

impl<K: Copy + PartialEq> FrameScheduler<K> {
    /// Creates a scheduler ticking every `interval`.
    pub fn new(interval: Duration, vsync_enabled: bool) -> Self {
        Self {
            interval,
            last_vsync: Instant::now(),
            vsync_enabled,
            waiting: Vec::new(),
        }
    }

    /// Requests a frame for `id` on the next tick. Returns `false` if one was
    /// already requested.
    pub fn schedule(&mut self, id: K) -> bool {
        if self.waiting.contains(&id) {
            return false;
        }
        self.waiting.push(id);
        true
    }

    /// Withdraws a requested frame. Returns whether one was withdrawn.
    pub fn cancel(&mut self, id: K) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|w| *w != id);
        before != self.waiting.len()
    }

    /// Whether `id` waits for a tick.
    pub fn is_scheduled(&self, id: K) -> bool {
        self.waiting.contains(&id)
    }

    /// When the worker must wake up, `None` when nothing waits.
    pub fn deadline(&self) -> Option<Instant> {
        if self.waiting.is_empty() {
            return None;
        }
        if !self.vsync_enabled {
            return Some(Instant::now());
        }
        Some(self.last_vsync + self.interval)
    }

    /// Whether the deadline has passed.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|d| d <= now)
    }

    /// Starts a new vsync period and returns the contexts to draw.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        if self.vsync_enabled {
            // Stay on the vsync grid after a late wakeup.
            let late = now.saturating_duration_since(self.last_vsync);
            let periods = (late.as_nanos() / self.interval.as_nanos().max(1)).max(1) as u32;
            self.last_vsync += self.interval * periods;
        } else {
            self.last_vsync = now;
        }
        std::mem::take(&mut self.waiting)
    }

    /// Stops pacing frames on vsync.
    pub fn disable_vsync(&mut self) {
        self.vsync_enabled = false;
    }

    /// The tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_is_a_set() {
        let mut scheduler = FrameScheduler::new(Duration::from_millis(16), true);
        assert!(scheduler.deadline().is_none());
        assert!(scheduler.schedule(1));
        assert!(!scheduler.schedule(1));
        assert!(scheduler.schedule(2));
        assert!(scheduler.cancel(1));
        assert!(!scheduler.cancel(1));
        assert!(scheduler.is_scheduled(2));
    }

    #[test]
    fn disabled_vsync_is_due_immediately() {
        let mut scheduler = FrameScheduler::new(Duration::from_secs(60), true);
        scheduler.schedule(7u32);
        assert!(!scheduler.is_due(Instant::now()));
        scheduler.disable_vsync();
        assert!(scheduler.is_due(Instant::now()));
        assert_eq!(scheduler.take_due(Instant::now()), vec![7]);
        assert!(scheduler.deadline().is_none());
    }

    #[test]
    fn late_wakeup_stays_on_the_grid() {
        let interval = Duration::from_millis(10);
        let mut scheduler = FrameScheduler::new(interval, true);
        scheduler.schedule(1u32);
        let start = scheduler.deadline().unwrap() - interval;
        scheduler.take_due(start + Duration::from_millis(35));
        scheduler.schedule(1);
        assert_eq!(scheduler.deadline(), Some(start + Duration::from_millis(40)));
    }
}
