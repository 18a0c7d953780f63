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

//! Registry of the listeners of one render context.
//!
//! The registry lives on the render thread and is only touched by tasks, so
//! a registration change can never overlap a dispatch. Each dispatch clones
//! the listener `Arc` first; replacing or removing a listener while its
//! dispatch runs only drops the registry's reference.

use std::sync::Arc;

use hwr_core::callback::{
    FrameCompleteCallback, FrameDrawingCallback, FrameMetrics, FrameMetricsObserver, Picture,
    PictureCapturedCallback,
};

/// The listeners of one render context.
#[derive(Default)]
pub struct CallbackRegistry {
    frame_drawing: Option<Arc<dyn FrameDrawingCallback>>,
    frame_complete: Option<Arc<dyn FrameCompleteCallback>>,
    picture_captured: Option<Arc<dyn PictureCapturedCallback>>,
    metrics_observers: Vec<Arc<dyn FrameMetricsObserver>>,
}

// Identity of a listener: the data pointer, ignoring the vtable.
fn same_listener<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl CallbackRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces or clears the frame-drawing listener.
    pub fn set_frame_drawing(&mut self, callback: Option<Arc<dyn FrameDrawingCallback>>) {
        self.frame_drawing = callback;
    }

    /// Replaces or clears the pending frame-complete listener.
    pub fn set_frame_complete(&mut self, callback: Option<Arc<dyn FrameCompleteCallback>>) {
        self.frame_complete = callback;
    }

    /// Replaces or clears the picture listener.
    pub fn set_picture_captured(&mut self, callback: Option<Arc<dyn PictureCapturedCallback>>) {
        self.picture_captured = callback;
    }

    /// Whether a picture listener is registered.
    pub fn has_picture_listener(&self) -> bool {
        self.picture_captured.is_some()
    }

    /// Adds a metrics observer. Returns `false` if it was already registered.
    pub fn add_metrics_observer(&mut self, observer: Arc<dyn FrameMetricsObserver>) -> bool {
        if self
            .metrics_observers
            .iter()
            .any(|o| same_listener(o, &observer))
        {
            log::debug!("Frame metrics observer already registered");
            return false;
        }
        self.metrics_observers.push(observer);
        true
    }

    /// Removes a metrics observer. Removing an unknown observer is a no-op.
    pub fn remove_metrics_observer(&mut self, observer: &Arc<dyn FrameMetricsObserver>) -> bool {
        let before = self.metrics_observers.len();
        self.metrics_observers.retain(|o| !same_listener(o, observer));
        before != self.metrics_observers.len()
    }

    /// Number of registered metrics observers.
    pub fn metrics_observer_count(&self) -> usize {
        self.metrics_observers.len()
    }

    /// Notifies the frame-drawing listener.
    pub fn dispatch_frame_drawing(&self, frame_number: u64) {
        if let Some(callback) = self.frame_drawing.clone() {
            callback.on_frame_draw(frame_number);
        }
    }

    /// Fires and forgets the frame-complete listener. Returns whether one fired.
    pub fn dispatch_frame_complete(&mut self, frame_number: u64) -> bool {
        match self.frame_complete.take() {
            Some(callback) => {
                callback.on_frame_complete(frame_number);
                true
            }
            None => false,
        }
    }

    /// Delivers a picture. Returns `false` when no listener is registered.
    pub fn dispatch_picture(&self, picture: Picture) -> bool {
        match self.picture_captured.clone() {
            Some(callback) => {
                callback.on_picture_captured(picture);
                true
            }
            None => false,
        }
    }

    /// Delivers frame metrics to every observer, in registration order.
    pub fn dispatch_metrics(&self, metrics: &FrameMetrics) {
        let observers: Vec<_> = self.metrics_observers.clone();
        for observer in observers {
            observer.on_frame_metrics(metrics);
        }
    }

    /// Releases every listener.
    pub fn clear(&mut self) {
        let released = self.frame_drawing.take().is_some() as usize
            + self.frame_complete.take().is_some() as usize
            + self.picture_captured.take().is_some() as usize
            + std::mem::take(&mut self.metrics_observers).len();
        if released > 0 {
            log::debug!("Released {released} listeners");
        }
    }
}
