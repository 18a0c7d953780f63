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

//! Contracts of the graphics backend driven by the render thread.
//!
//! The backend and every context it creates live on the render thread for
//! their whole life. They are `Send` so that they can be moved there at
//! startup, never shared.

use std::sync::Arc;

use crate::error::RenderError;
use crate::frame::DrawOutcome;
use crate::scene::{NodeSnapshot, SceneSnapshot};
use crate::surface::PresentationSurface;

/// Options for a new graphics context.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Whether the output needs an alpha channel.
    pub translucent: bool,
    /// A debug name.
    pub name: String,
}

/// How aggressively the backend should release memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrimLevel {
    /// No UI is visible; drop what is cheap to rebuild.
    UiHidden,
    /// The process went to the background; drop all caches.
    Background,
    /// Release everything that can be released.
    Complete,
}

impl TrimLevel {
    /// Parses the numeric trim levels used by platform memory callbacks.
    pub fn from_raw(level: i32) -> Option<Self> {
        match level {
            20 => Some(TrimLevel::UiHidden),
            40 => Some(TrimLevel::Background),
            60..=80 => Some(TrimLevel::Complete),
            _ => None,
        }
    }
}

/// The process-wide graphics backend.
pub trait GraphicsBackend: Send {
    /// The name of the backend, for logs.
    fn name(&self) -> &str;

    /// Creates a context for one render target.
    fn create_context(
        &mut self,
        options: &ContextOptions,
    ) -> Result<Box<dyn GraphicsContext>, RenderError>;

    /// Releases memory according to `level`.
    fn trim_memory(&mut self, level: TrimLevel);

    /// Warms up caches ahead of the first frame.
    fn preload(&mut self) {}

    /// A human-readable dump of backend statistics.
    fn dump_stats(&self) -> String {
        String::new()
    }
}

/// The graphics state of one render target.
pub trait GraphicsContext: Send {
    /// Binds a presentation surface, or detaches the current one with `None`.
    ///
    /// When this returns, the previous surface is no longer written to.
    fn bind_surface(
        &mut self,
        surface: Option<Arc<dyn PresentationSurface>>,
    ) -> Result<(), RenderError>;

    /// Whether a surface is bound.
    fn has_surface(&self) -> bool;

    /// Draws a committed snapshot.
    fn draw(&mut self, snapshot: &SceneSnapshot) -> Result<DrawOutcome, RenderError>;

    /// Renders a node ahead of the next frame.
    fn build_layer(&mut self, node: &NodeSnapshot) -> Result<(), RenderError> {
        let _ = node;
        Ok(())
    }

    /// Asks the bound surface to pre-allocate its buffers.
    fn allocate_buffers(&mut self) {}

    /// Drops cached GPU resources owned by this context.
    fn destroy_hardware_resources(&mut self);

    /// Releases the context. No method is called afterwards.
    fn release(&mut self);
}

/// Opaque work that must run on the render thread with the backend current.
pub trait WorkerFunctor: Send {
    /// Runs the work.
    fn run(self: Box<Self>, backend: &mut dyn GraphicsBackend);
}

impl<F> WorkerFunctor for F
where
    F: FnOnce(&mut dyn GraphicsBackend) + Send,
{
    fn run(self: Box<Self>, backend: &mut dyn GraphicsBackend) {
        (*self)(backend)
    }
}
