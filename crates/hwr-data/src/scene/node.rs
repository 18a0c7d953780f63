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

use std::sync::{Arc, Mutex};

use hwr_core::scene::{AnimationState, DisplayList, NodeId, RenderNode};

/// A render node holding a prerecorded display list.
///
/// The caller swaps the list whenever its content changes. An optional
/// frame-count animation keeps the node in the animating set for a fixed
/// number of ticks.
#[derive(Debug)]
pub struct RecordedNode {
    id: NodeId,
    name: String,
    display_list: Mutex<DisplayList>,
    frames_left: Mutex<u32>,
}

impl RecordedNode {
    /// Creates an empty node.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_display_list(name, DisplayList::new())
    }

    /// Creates a node with initial content.
    pub fn with_display_list(name: impl Into<String>, display_list: DisplayList) -> Arc<Self> {
        Arc::new(Self {
            id: NodeId::next(),
            name: name.into(),
            display_list: Mutex::new(display_list),
            frames_left: Mutex::new(0),
        })
    }

    /// Replaces the node's content.
    pub fn set_display_list(&self, display_list: DisplayList) {
        *self.display_list.lock().unwrap() = display_list;
    }

    /// Keeps the node animating for `frames` more ticks. The tick that
    /// consumes the last frame reports completion.
    pub fn animate_for_frames(&self, frames: u32) {
        *self.frames_left.lock().unwrap() = frames;
    }
}

impl RenderNode for RecordedNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn record(&self) -> Result<DisplayList, String> {
        Ok(self.display_list.lock().unwrap().clone())
    }

    fn animate(&self, _frame_time_nanos: i64) -> AnimationState {
        let mut frames_left = self.frames_left.lock().unwrap();
        *frames_left = frames_left.saturating_sub(1);
        if *frames_left > 0 {
            AnimationState::Running
        } else {
            AnimationState::Finished
        }
    }
}
