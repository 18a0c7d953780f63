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

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hwr_core::backend::{ContextOptions, GraphicsBackend, GraphicsContext, TrimLevel};
use hwr_core::RenderError;

use super::context::SoftwareContext;

/// Counters shared by the backend and its contexts.
#[derive(Debug, Default)]
pub(crate) struct BackendCounters {
    pub(crate) contexts: AtomicU64,
    pub(crate) frames_presented: AtomicU64,
    pub(crate) frames_skipped: AtomicU64,
    pub(crate) layers_built: AtomicU64,
}

/// The software graphics backend.
#[derive(Debug, Default)]
pub struct SoftwareBackend {
    counters: Arc<BackendCounters>,
    preloaded: bool,
    last_trim: Option<TrimLevel>,
}

impl SoftwareBackend {
    /// Creates a backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames presented by every context of this backend.
    pub fn frames_presented(&self) -> u64 {
        self.counters.frames_presented.load(Ordering::Relaxed)
    }

    /// The most recent trim level applied.
    pub fn last_trim(&self) -> Option<TrimLevel> {
        self.last_trim
    }
}

impl GraphicsBackend for SoftwareBackend {
    fn name(&self) -> &str {
        "software"
    }

    fn create_context(
        &mut self,
        options: &ContextOptions,
    ) -> Result<Box<dyn GraphicsContext>, RenderError> {
        self.counters.contexts.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "Software context '{}' created (translucent: {})",
            options.name,
            options.translucent
        );
        Ok(Box::new(SoftwareContext::new(
            options,
            self.counters.clone(),
        )))
    }

    fn trim_memory(&mut self, level: TrimLevel) {
        // No shared caches; remember the level for diagnostics.
        self.last_trim = Some(level);
    }

    fn preload(&mut self) {
        if !self.preloaded {
            log::debug!("Software backend preloaded");
            self.preloaded = true;
        }
    }

    fn dump_stats(&self) -> String {
        let c = &self.counters;
        let mut out = String::new();
        let _ = writeln!(out, "Backend: software");
        let _ = writeln!(out, "  Contexts created: {}", c.contexts.load(Ordering::Relaxed));
        let _ = writeln!(
            out,
            "  Frames presented: {}",
            c.frames_presented.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "  Frames skipped: {}",
            c.frames_skipped.load(Ordering::Relaxed)
        );
        let _ = writeln!(out, "  Layers built: {}", c.layers_built.load(Ordering::Relaxed));
        out
    }
}
