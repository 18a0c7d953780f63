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

//! Listener contracts for notifications raised on the render thread.
//!
//! Listeners are registered as `Arc`s. The registry holds one strong
//! reference per registration and clones it for the duration of a dispatch,
//! so a listener outlives any dispatch in flight and is dropped exactly once
//! after both removal and the last dispatch complete.
//!
//! Every trait has a blanket impl for matching closures.

use crate::frame::FrameInfo;
use crate::scene::NodeSnapshot;

/// Called once per frame, right before the draw is issued.
pub trait FrameDrawingCallback: Send + Sync {
    /// `frame_number` is the frame about to be drawn.
    fn on_frame_draw(&self, frame_number: u64);
}

/// Called once after a frame was presented, then forgotten.
pub trait FrameCompleteCallback: Send + Sync {
    /// `frame_number` is the frame that completed.
    fn on_frame_complete(&self, frame_number: u64);
}

/// A recorded copy of the scene, produced when a capture was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    /// The frame the picture was taken from.
    pub frame_number: u64,
    /// The drawn nodes, in draw order.
    pub nodes: Vec<NodeSnapshot>,
}

/// Receives captured pictures.
pub trait PictureCapturedCallback: Send + Sync {
    /// Delivers one picture.
    fn on_picture_captured(&self, picture: Picture);
}

/// Timing of one completed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetrics {
    /// The completed frame.
    pub frame_number: u64,
    /// The full timing record of the frame.
    pub info: FrameInfo,
}

/// Receives the metrics of every completed frame.
pub trait FrameMetricsObserver: Send + Sync {
    /// Delivers the metrics of one frame.
    fn on_frame_metrics(&self, metrics: &FrameMetrics);
}

impl<F: Fn(u64) + Send + Sync> FrameDrawingCallback for F {
    fn on_frame_draw(&self, frame_number: u64) {
        self(frame_number)
    }
}

impl<F: Fn(u64) + Send + Sync> FrameCompleteCallback for F {
    fn on_frame_complete(&self, frame_number: u64) {
        self(frame_number)
    }
}

impl<F: Fn(Picture) + Send + Sync> PictureCapturedCallback for F {
    fn on_picture_captured(&self, picture: Picture) {
        self(picture)
    }
}

impl<F: Fn(&FrameMetrics) + Send + Sync> FrameMetricsObserver for F {
    fn on_frame_metrics(&self, metrics: &FrameMetrics) {
        self(metrics)
    }
}
