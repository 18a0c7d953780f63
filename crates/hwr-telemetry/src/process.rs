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

//! Process-wide statistics kept by the render thread.

use std::fmt::Write;
use std::time::Duration;

use hwr_core::FrameInfo;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::jank::{DumpFlags, JankTracker};

/// Jank statistics over every context of the process, plus memory usage.
pub struct ProcessStats {
    jank: JankTracker,
    system: System,
    pid: Option<Pid>,
}

impl ProcessStats {
    /// Creates empty statistics.
    pub fn new(frame_interval: Duration) -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                log::warn!("Process memory statistics unavailable: {e}");
                None
            }
        };
        Self {
            jank: JankTracker::new(frame_interval),
            system: System::new(),
            pid,
        }
    }

    /// Records a frame of any context.
    pub fn add_frame(&mut self, info: &FrameInfo) {
        self.jank.add_frame(info);
    }

    /// The underlying tracker.
    pub fn jank(&self) -> &JankTracker {
        &self.jank
    }

    /// Resident memory of the process, in bytes.
    pub fn resident_memory(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        self.system.process(pid).map(|p| p.memory())
    }

    /// Formats the statistics.
    pub fn dump(&mut self) -> String {
        let mut out = self
            .jank
            .dump("process", DumpFlags::FRAME_STATS | DumpFlags::JANK_STATS);
        match self.resident_memory() {
            Some(bytes) => {
                let _ = writeln!(out, "Resident memory: {:.2} MiB", bytes as f64 / 1048576.0);
            }
            None => out.push_str("Resident memory: unavailable\n"),
        }
        out
    }

    /// Starts a new statistics period.
    pub fn rotate(&mut self) {
        log::info!(
            "Rotating process stats after {} frames ({} janky)",
            self.jank.total_frames(),
            self.jank.janky_frames()
        );
        self.jank.reset();
    }
}
