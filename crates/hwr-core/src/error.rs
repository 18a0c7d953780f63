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

//! Defines the error taxonomy of the renderer.
//!
//! Three classes exist:
//! - fatal conditions (integration defects) go through [`fatal!`](crate::fatal) and never
//!   produce a value;
//! - recoverable conditions are reported as the enums below;
//! - best-effort operations simply log and continue.

use thiserror::Error;

/// Logs a message at error level and aborts the current thread by panicking.
///
/// Used for conditions that indicate a build or integration defect, such as a
/// frame-info size mismatch or a failure to attach the render thread to the
/// caller runtime. When raised on the render thread, the panic terminates the
/// thread and every caller blocked on it observes the failure.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {{
        let message = format!($($arg)+);
        $crate::log::error!("FATAL: {message}");
        panic!("{}", message)
    }};
}

/// An error raised by the graphics backend or the render thread.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The backend failed to create a graphics context.
    #[error("Failed to create graphics context: {0}")]
    ContextCreationFailed(String),
    /// No buffer could be obtained from the presentation surface.
    #[error("Failed to acquire surface buffer: {0}")]
    SurfaceAcquisitionFailed(String),
    /// The presentation surface could not be bound.
    #[error("Failed to bind surface '{name}': {reason}")]
    SurfaceBindFailed {
        /// The name of the surface.
        name: String,
        /// A description of the failure.
        reason: String,
    },
    /// A handle did not reference a live object.
    #[error("Invalid or stale handle: {0}")]
    InvalidHandle(String),
    /// The graphics device was lost. This is unrecoverable.
    #[error("The graphics device was lost")]
    DeviceLost,
    /// An error reported by a buffer queue.
    #[error("Buffer queue error: {0}")]
    Buffer(#[from] BufferError),
}

/// An error reported by a producer/consumer buffer queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Every slot of the queue is dequeued, queued or acquired.
    #[error("No free buffer slot (max buffer count {max})")]
    NoFreeBuffer {
        /// The maximum number of buffers of the queue.
        max: usize,
    },
    /// The consumer tried to acquire while nothing was queued.
    #[error("No buffer is available to acquire")]
    NoBufferAvailable,
    /// The consumer released a buffer that it did not hold.
    #[error("Buffer in slot {0} is not acquired")]
    NotAcquired(u64),
    /// The producer side is not connected to any context.
    #[error("Surface is not connected")]
    NotConnected,
    /// Another context already holds the surface.
    #[error("Surface is already connected")]
    AlreadyConnected,
}

/// An error returned by the off-screen snapshot capture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Width or height is not strictly positive.
    #[error("Invalid width {width} or height {height}")]
    InvalidDimensions {
        /// The requested width.
        width: i32,
        /// The requested height.
        height: i32,
    },
    /// The rendered buffer could not be acquired from the consumer.
    #[error("Failed to acquire buffer: {0}")]
    AcquireFailed(BufferError),
    /// The acquired buffer item carried no pixel data.
    #[error("Acquired buffer item has no graphic buffer")]
    NullBuffer,
    /// The temporary proxy could not be created.
    #[error("Failed to set up capture context: {0}")]
    Setup(String),
}

/// An error raised while attaching the render thread to the caller runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to attach thread '{thread_name}' to caller runtime: {reason}")]
pub struct AttachError {
    /// The name of the thread being attached.
    pub thread_name: String,
    /// A description of the failure.
    pub reason: String,
}

/// A collaborator that surfaces errors raised on the render thread to the
/// caller's environment (for instance as an exception in a managed runtime).
pub trait ErrorReporter: Send + Sync {
    /// Reports an error message.
    fn on_error(&self, message: &str);
}

impl<T: ErrorReporter + ?Sized> ErrorReporter for std::sync::Arc<T> {
    fn on_error(&self, message: &str) {
        (**self).on_error(message);
    }
}
