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

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use hwr_core::backend::{ContextOptions, GraphicsContext};
use hwr_core::scene::{NodeId, NodeSnapshot, SceneSnapshot, SwapBehavior};
use hwr_core::surface::{ColorSpace, PixelBuffer, PresentationSurface};
use hwr_core::{DrawOutcome, RenderError};

use super::backend::BackendCounters;
use super::raster::{self, OPAQUE_BLACK};

/// One software render target.
pub struct SoftwareContext {
    name: String,
    translucent: bool,
    surface: Option<Arc<dyn PresentationSurface>>,
    // Last presented frame, the starting point when the swap preserves.
    previous: Option<PixelBuffer>,
    layers: HashMap<NodeId, PixelBuffer>,
    counters: Arc<BackendCounters>,
}

impl SoftwareContext {
    pub(crate) fn new(options: &ContextOptions, counters: Arc<BackendCounters>) -> Self {
        Self {
            name: options.name.clone(),
            translucent: options.translucent,
            surface: None,
            previous: None,
            layers: HashMap::new(),
            counters,
        }
    }

    fn background(&self, snapshot: &SceneSnapshot) -> u32 {
        if self.translucent && !snapshot.settings.opaque {
            0
        } else {
            OPAQUE_BLACK
        }
    }
}

impl GraphicsContext for SoftwareContext {
    fn bind_surface(
        &mut self,
        surface: Option<Arc<dyn PresentationSurface>>,
    ) -> Result<(), RenderError> {
        if let (Some(old), Some(new)) = (&self.surface, &surface) {
            if Arc::ptr_eq(old, new) {
                return Ok(());
            }
        }
        if let Some(new) = &surface {
            new.connect().map_err(|e| RenderError::SurfaceBindFailed {
                name: new.name().to_owned(),
                reason: e.to_string(),
            })?;
        }
        if let Some(old) = self.surface.take() {
            old.disconnect();
        }
        self.previous = None;
        self.surface = surface;
        Ok(())
    }

    fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    fn draw(&mut self, snapshot: &SceneSnapshot) -> Result<DrawOutcome, RenderError> {
        let surface = self
            .surface
            .clone()
            .ok_or_else(|| RenderError::SurfaceAcquisitionFailed("no surface bound".to_owned()))?;
        let (width, height) = surface.size();
        if width == 0 || height == 0 {
            self.counters.frames_skipped.fetch_add(1, Ordering::Relaxed);
            return Ok(DrawOutcome::Skipped);
        }

        let mut item = surface.dequeue_buffer()?;
        let mut target = match item.buffer.take() {
            Some(buffer) if buffer.width == width && buffer.height == height => buffer,
            _ => PixelBuffer::new(width, height),
        };
        match (&self.previous, snapshot.settings.swap_behavior) {
            (Some(previous), SwapBehavior::Preserve)
                if previous.width == width && previous.height == height =>
            {
                target.pixels.copy_from_slice(&previous.pixels);
            }
            _ => target.fill(self.background(snapshot)),
        }
        raster::rasterize(&mut target, snapshot);
        target.color_space = snapshot.settings.wide_gamut.then_some(ColorSpace::DisplayP3);

        if snapshot.settings.swap_behavior == SwapBehavior::Preserve {
            self.previous = Some(target.clone());
        }
        item.frame_number = snapshot.frame_number;
        item.buffer = Some(target);
        surface.queue_buffer(item)?;
        self.counters.frames_presented.fetch_add(1, Ordering::Relaxed);
        log::trace!("'{}' presented frame {}", self.name, snapshot.frame_number);
        Ok(DrawOutcome::Presented)
    }

    fn build_layer(&mut self, node: &NodeSnapshot) -> Result<(), RenderError> {
        let (width, height) = self
            .surface
            .as_ref()
            .map(|s| s.size())
            .unwrap_or((0, 0));
        let mut layer = PixelBuffer::new(width, height);
        let snapshot = SceneSnapshot {
            frame_number: 0,
            vsync_nanos: 0,
            settings: Default::default(),
            nodes: vec![node.clone()],
        };
        raster::rasterize(&mut layer, &snapshot);
        self.layers.insert(node.id, layer);
        self.counters.layers_built.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn allocate_buffers(&mut self) {
        if let Some(surface) = &self.surface {
            surface.allocate_buffers();
        }
    }

    fn destroy_hardware_resources(&mut self) {
        self.layers.clear();
        self.previous = None;
    }

    fn release(&mut self) {
        self.destroy_hardware_resources();
        if let Some(surface) = self.surface.take() {
            surface.disconnect();
        }
        log::debug!("Software context '{}' released", self.name);
    }
}
