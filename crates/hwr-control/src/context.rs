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

//! The render-thread side of one proxy.
//!
//! A frame goes through two phases:
//!
//! 1. **Sync**: the caller's frame info and queued scene mutations are
//!    committed, animations are ticked, layer updates applied, and every
//!    top-level node is recorded into a [`SceneSnapshot`].
//! 2. **Draw**: the snapshot, and nothing else, is handed to the backend.

use std::sync::Arc;

use hwr_core::backend::GraphicsContext;
use hwr_core::callback::{FrameMetrics, Picture};
use hwr_core::math::{Rect, Vec3};
use hwr_core::properties::RenderProperties;
use hwr_core::scene::{
    ContextState, FrameSettings, LightGeometry, NodeSnapshot, RenderNode, SceneSnapshot,
    SceneStats, SwapBehavior,
};
use hwr_core::surface::PresentationSurface;
use hwr_core::{
    fatal, DrawOutcome, FrameInfo, FrameInfoFlags, FrameInfoIndex, Handle, RenderError,
    SyncResult, UI_THREAD_FRAME_INFO_SIZE,
};
use hwr_data::{LayerRegistry, RootScene, RootSceneState};
use hwr_telemetry::{DumpFlags, JankTracker, ProcessStats};

use crate::callbacks::CallbackRegistry;

/// Handle of a [`RenderContext`] owned by the render thread.
pub type ContextId = Handle<RenderContext>;

/// Worker-owned state of one render target.
pub struct RenderContext {
    name: String,
    state: ContextState,
    gpu: Box<dyn GraphicsContext>,
    root: Arc<RootScene>,
    scene: RootSceneState,
    layers: LayerRegistry,
    callbacks: CallbackRegistry,
    settings: FrameSettings,
    frame_info: FrameInfo,
    frame_number: u64,
    capture_requested: bool,
    jank: JankTracker,
}

impl RenderContext {
    /// Wraps a freshly created graphics context.
    pub fn new(
        name: String,
        translucent: bool,
        gpu: Box<dyn GraphicsContext>,
        root: Arc<RootScene>,
        jank: JankTracker,
    ) -> Self {
        Self {
            name,
            state: ContextState::Uninitialized,
            gpu,
            root,
            scene: RootSceneState::new(),
            layers: LayerRegistry::new(),
            callbacks: CallbackRegistry::new(),
            settings: FrameSettings {
                translucent,
                ..FrameSettings::default()
            },
            frame_info: FrameInfo::new(),
            frame_number: 0,
            capture_requested: false,
            jank,
        }
    }

    /// The debug name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the context.
    pub fn set_name(&mut self, name: String) {
        log::debug!("Context '{}' renamed to '{name}'", self.name);
        self.name = name;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// The committed settings.
    pub fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    /// The deferred layers of this context.
    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    /// Mutable access to the deferred layers.
    pub fn layers_mut(&mut self) -> &mut LayerRegistry {
        &mut self.layers
    }

    /// The listeners of this context.
    pub fn callbacks_mut(&mut self) -> &mut CallbackRegistry {
        &mut self.callbacks
    }

    /// Number of frames handed to the backend so far.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Binds or detaches the presentation surface. When this returns the
    /// previous surface is no longer used.
    pub fn set_surface(&mut self, surface: Option<Arc<dyn PresentationSurface>>) {
        let name = surface.as_ref().map(|s| s.name().to_owned());
        match self.gpu.bind_surface(surface) {
            Ok(()) => {
                log::info!("Context '{}' bound to surface {name:?}", self.name);
                match (self.state, name.is_some()) {
                    (ContextState::Uninitialized, true) => self.state = ContextState::Active,
                    (ContextState::Active | ContextState::Paused, false) => {
                        self.state = ContextState::Uninitialized
                    }
                    _ => {}
                }
            }
            Err(e) => {
                log::error!("Context '{}' failed to bind surface: {e}", self.name);
                self.root.report_error(&e.to_string());
                if self.state != ContextState::Stopped {
                    self.state = ContextState::Uninitialized;
                }
            }
        }
    }

    /// Asks the bound surface to pre-allocate.
    pub fn allocate_buffers(&mut self) {
        self.gpu.allocate_buffers();
    }

    /// Pauses the context. Returns `true` if the context was drawing.
    pub fn pause(&mut self) -> bool {
        if self.state == ContextState::Active {
            self.state = ContextState::Paused;
            return true;
        }
        false
    }

    /// Suppresses or resumes drawing.
    pub fn set_stopped(&mut self, stopped: bool) {
        match (self.state, stopped) {
            (ContextState::Destroyed, _) => {}
            (ContextState::Stopped, false) => {
                self.state = if self.gpu.has_surface() {
                    ContextState::Active
                } else {
                    ContextState::Uninitialized
                };
                log::debug!("Context '{}' restarted", self.name);
            }
            (state, true) if state != ContextState::Stopped => {
                self.state = ContextState::Stopped;
                log::debug!("Context '{}' stopped", self.name);
            }
            _ => {}
        }
    }

    /// Sets the shadow alphas, each in `0.0..=1.0`.
    pub fn set_light_alpha(&mut self, ambient: f32, spot: f32) {
        self.settings.ambient_light_alpha = (255.0 * ambient.clamp(0.0, 1.0)) as u8;
        self.settings.spot_light_alpha = (255.0 * spot.clamp(0.0, 1.0)) as u8;
    }

    /// Sets the shadow light source.
    pub fn set_light_geometry(&mut self, center: Vec3, radius: f32) {
        self.settings.light_geometry = LightGeometry { center, radius };
    }

    /// Whether the content covers the whole surface.
    pub fn set_opaque(&mut self, opaque: bool) {
        self.settings.opaque = opaque;
    }

    /// Enables wide-gamut rendering.
    pub fn set_wide_gamut(&mut self, wide_gamut: bool) {
        self.settings.wide_gamut = wide_gamut;
    }

    /// Enables automatic dark theming.
    pub fn set_force_dark(&mut self, force_dark: bool) {
        self.settings.force_dark = force_dark;
    }

    /// Sets the swap behavior.
    pub fn set_swap_behavior(&mut self, swap_behavior: SwapBehavior) {
        self.settings.swap_behavior = swap_behavior;
    }

    /// Sets the content area. An empty rectangle clears it.
    pub fn set_content_draw_bounds(&mut self, bounds: Rect) {
        self.settings.content_bounds = (!bounds.is_empty()).then_some(bounds);
    }

    /// Requests a picture of the next presented frame.
    pub fn request_picture_capture(&mut self) {
        if !self.callbacks.has_picture_listener() {
            log::warn!("Picture capture requested on '{}' without a listener", self.name);
        }
        self.capture_requested = true;
    }

    /// Records a node and hands it to the backend ahead of the next frame.
    pub fn build_layer(&mut self, node: &Arc<dyn RenderNode>) {
        if let Some(snapshot) = self.record_node(node) {
            if let Err(e) = self.gpu.build_layer(&snapshot) {
                log::warn!("Failed to build layer for '{}': {e}", snapshot.name);
            }
        }
    }

    /// Drops layer textures and backend caches.
    pub fn destroy_hardware_resources(&mut self) {
        self.layers.clear_textures();
        self.gpu.destroy_hardware_resources();
    }

    /// Counts of the committed scene.
    pub fn scene_stats(&self) -> SceneStats {
        self.scene.stats(self.root.pending_len())
    }

    /// Formats this context's frame statistics.
    pub fn dump_profile_info(&mut self, flags: DumpFlags) -> String {
        let out = self.jank.dump(&self.name, flags);
        if flags.contains(DumpFlags::RESET) {
            self.jank.reset();
        }
        out
    }

    /// Commits the caller's state and draws one frame.
    pub fn sync_and_draw(
        &mut self,
        ui_info: &[i64; UI_THREAD_FRAME_INFO_SIZE],
        queued_at: i64,
        properties: &RenderProperties,
        stats: &mut ProcessStats,
    ) -> SyncResult {
        if self.state == ContextState::Destroyed {
            log::warn!("sync_and_draw on destroyed context '{}'", self.name);
            return SyncResult::FRAME_DROPPED;
        }
        self.frame_info.import_ui_thread_info(ui_info);
        self.frame_info.set(FrameInfoIndex::SyncQueued, queued_at);
        self.frame_info.mark(FrameInfoIndex::SyncStart);
        if self.state == ContextState::Paused {
            self.state = ContextState::Active;
        }

        self.scene.apply(self.root.take_pending());
        let frame_time = self.frame_time();
        let (mut result, snapshot) = self.prepare(frame_time, properties);
        result |= self.draw_if_possible(snapshot, stats);
        result
    }

    /// Draws a frame driven by the render thread alone: animations advance
    /// but the caller's queued mutations stay queued. Returns whether
    /// animations still need frames.
    pub fn draw_render_thread_frame(
        &mut self,
        vsync_nanos: i64,
        properties: &RenderProperties,
        stats: &mut ProcessStats,
    ) -> bool {
        if self.state != ContextState::Active {
            return false;
        }
        self.frame_info = FrameInfo::new();
        self.frame_info.set(FrameInfoIndex::IntendedVsync, vsync_nanos);
        self.frame_info.set(FrameInfoIndex::Vsync, vsync_nanos);
        self.frame_info.add_flag(FrameInfoFlags::RT_ANIMATION);
        self.frame_info.mark(FrameInfoIndex::SyncStart);

        let (result, snapshot) = self.prepare(vsync_nanos, properties);
        self.draw_if_possible(snapshot, stats);
        result.contains(SyncResult::REDRAW_REQUIRED)
    }

    /// Draws a single node without a caller sync, as when rendering into an
    /// off-screen surface.
    pub fn draw_node(
        &mut self,
        node: &Arc<dyn RenderNode>,
        properties: &RenderProperties,
        stats: &mut ProcessStats,
    ) -> SyncResult {
        if self.state == ContextState::Destroyed {
            return SyncResult::FRAME_DROPPED;
        }
        let now = hwr_core::time::now_nanos();
        self.frame_info = FrameInfo::new();
        self.frame_info.set(FrameInfoIndex::IntendedVsync, now);
        self.frame_info.set(FrameInfoIndex::Vsync, now);
        self.frame_info.add_flag(FrameInfoFlags::SURFACE_CANVAS);
        self.frame_info.mark(FrameInfoIndex::SyncStart);
        self.layers.apply_pending();

        let mut settings = self.settings;
        settings.high_contrast_text = properties.high_contrast_text;
        let snapshot = SceneSnapshot {
            frame_number: self.frame_number + 1,
            vsync_nanos: now,
            settings,
            nodes: self.record_node(node).into_iter().collect(),
        };
        self.draw_if_possible(snapshot, stats)
    }

    /// Tears the context down. Terminal.
    pub fn destroy(&mut self) {
        if self.state == ContextState::Destroyed {
            return;
        }
        self.scene.clear();
        self.layers.clear();
        self.callbacks.clear();
        self.gpu.release();
        self.state = ContextState::Destroyed;
        log::info!(
            "Context '{}' destroyed after {} frames",
            self.name,
            self.frame_number
        );
    }

    fn frame_time(&self) -> i64 {
        match self.frame_info.get(FrameInfoIndex::Vsync) {
            0 => hwr_core::time::now_nanos(),
            vsync => vsync,
        }
    }

    // Sync steps 2 to 4: tick, apply layer updates, record.
    fn prepare(
        &mut self,
        frame_time: i64,
        properties: &RenderProperties,
    ) -> (SyncResult, SceneSnapshot) {
        let mut result = SyncResult::OK;
        let tick = self.scene.tick(frame_time);
        if tick.needs_redraw() {
            result |= SyncResult::REDRAW_REQUIRED;
        }
        self.layers.apply_pending();

        self.settings.high_contrast_text = properties.high_contrast_text;
        let nodes = self
            .scene
            .draw_order()
            .filter_map(|node| self.record_node(node))
            .collect();
        let snapshot = SceneSnapshot {
            frame_number: self.frame_number + 1,
            vsync_nanos: frame_time,
            settings: self.settings,
            nodes,
        };
        (result, snapshot)
    }

    fn record_node(&self, node: &Arc<dyn RenderNode>) -> Option<NodeSnapshot> {
        match node.record() {
            Ok(display_list) => Some(NodeSnapshot {
                id: node.id(),
                name: node.name().to_owned(),
                display_list,
            }),
            Err(e) => {
                self.root
                    .report_error(&format!("Failed to record node '{}': {e}", node.name()));
                None
            }
        }
    }

    fn draw_if_possible(&mut self, snapshot: SceneSnapshot, stats: &mut ProcessStats) -> SyncResult {
        if self.state == ContextState::Stopped {
            return SyncResult::CONTEXT_STOPPED;
        }
        if !self.gpu.has_surface() {
            return SyncResult::LOST_SURFACE_REWARD_IF_FOUND;
        }

        self.frame_number = snapshot.frame_number;
        let frame_number = self.frame_number;
        self.callbacks.dispatch_frame_drawing(frame_number);
        self.frame_info.mark(FrameInfoIndex::IssueDrawCommandsStart);

        match self.gpu.draw(&snapshot) {
            Ok(DrawOutcome::Presented) => {
                self.frame_info.mark(FrameInfoIndex::SwapBuffers);
                self.frame_info.mark(FrameInfoIndex::FrameCompleted);
                self.record_frame(stats);
                self.callbacks.dispatch_frame_complete(frame_number);
                self.callbacks.dispatch_metrics(&FrameMetrics {
                    frame_number,
                    info: self.frame_info,
                });
                if std::mem::take(&mut self.capture_requested) {
                    self.callbacks.dispatch_picture(Picture {
                        frame_number,
                        nodes: snapshot.nodes,
                    });
                }
                SyncResult::OK
            }
            Ok(DrawOutcome::Skipped) => {
                self.frame_info.add_flag(FrameInfoFlags::SKIPPED_FRAME);
                self.record_frame(stats);
                SyncResult::FRAME_DROPPED
            }
            Err(e @ (RenderError::SurfaceAcquisitionFailed(_) | RenderError::Buffer(_))) => {
                log::warn!("Context '{}' lost its surface: {e}", self.name);
                SyncResult::LOST_SURFACE_REWARD_IF_FOUND | SyncResult::FRAME_DROPPED
            }
            Err(e) => fatal!("Draw failed on context '{}': {e}", self.name),
        }
    }

    fn record_frame(&mut self, stats: &mut ProcessStats) {
        self.jank.add_frame(&self.frame_info);
        stats.add_frame(&self.frame_info);
    }
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("frame_number", &self.frame_number)
            .finish_non_exhaustive()
    }
}
