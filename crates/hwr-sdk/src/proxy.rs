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

//! The caller-side proxy of one render target.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;

use hwr_control::{ContextId, RenderContext, RenderThread};
use hwr_core::backend::WorkerFunctor;
use hwr_core::callback::{
    FrameCompleteCallback, FrameDrawingCallback, FrameMetricsObserver, PictureCapturedCallback,
};
use hwr_core::math::{Rect, Vec3};
use hwr_core::scene::{ContextState, NodeId, Placement, RenderNode, SceneStats, SwapBehavior};
use hwr_core::surface::{BufferConsumer, PixelBuffer, PresentationSurface};
use hwr_core::{fatal, RenderError, SyncResult, UI_THREAD_FRAME_INFO_SIZE};
use hwr_data::{LayerId, LayerInfo, RootScene};
use hwr_telemetry::DumpFlags;

/// The only object a caller interacts with for one render target.
///
/// Operations that produce no value are posted and return at once. The ones
/// that do produce a value block until the render thread answered. Tasks of
/// one proxy run in the order they were issued.
pub struct RenderProxy {
    thread: Arc<RenderThread>,
    context: ContextId,
    root: Arc<RootScene>,
    draw_lock: Mutex<()>,
    destroyed: AtomicBool,
}

impl RenderProxy {
    /// Creates the render-thread side of a new target drawing `root`.
    pub fn new(
        thread: Arc<RenderThread>,
        translucent: bool,
        root: Arc<RootScene>,
    ) -> Result<Self, RenderError> {
        let scene = root.clone();
        let context = thread.post_and_wait(move |state| state.create_context(translucent, scene))?;
        Ok(Self {
            thread,
            context,
            root,
            draw_lock: Mutex::new(()),
            destroyed: AtomicBool::new(false),
        })
    }

    /// The root scene this proxy draws.
    pub fn root(&self) -> &Arc<RootScene> {
        &self.root
    }

    /// The render thread this proxy posts to.
    pub fn thread(&self) -> &Arc<RenderThread> {
        &self.thread
    }

    fn post<F>(&self, task: F)
    where
        F: FnOnce(&mut RenderContext) + Send + 'static,
    {
        let id = self.context;
        self.thread.post(move |state| {
            if let Some(context) = state.context_mut(id) {
                task(context);
            }
        });
    }

    fn call<R, F>(&self, task: F) -> Option<R>
    where
        F: FnOnce(&mut RenderContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        let id = self.context;
        self.thread
            .post_and_wait(move |state| state.context_mut(id).map(task))
    }

    // --- Lifecycle ---

    /// Names the context for logs and profile dumps.
    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.post(move |ctx| ctx.set_name(name));
    }

    /// Binds a presentation surface, or detaches with `None`. Once the task
    /// ran the previous surface is never written again.
    pub fn set_surface(&self, surface: Option<Arc<dyn PresentationSurface>>) {
        self.post(move |ctx| ctx.set_surface(surface));
    }

    /// Asks the bound surface to pre-allocate its buffers.
    pub fn allocate_buffers(&self) {
        self.post(RenderContext::allocate_buffers);
    }

    /// Pauses drawing. Returns whether a scheduled frame was canceled.
    pub fn pause(&self) -> bool {
        let id = self.context;
        self.thread.post_and_wait(move |state| {
            let canceled = state.cancel_frame(id);
            if let Some(context) = state.context_mut(id) {
                context.pause();
            }
            canceled
        })
    }

    /// Suppresses or resumes drawing while keeping the state alive.
    pub fn set_stopped(&self, stopped: bool) {
        self.post(move |ctx| ctx.set_stopped(stopped));
    }

    /// Removes any scheduled render-thread frame.
    pub fn stop_drawing(&self) {
        let id = self.context;
        self.thread.post_and_wait(move |state| {
            state.cancel_frame(id);
        });
    }

    /// Requests a render-thread frame on the next vsync tick.
    pub fn notify_frame_pending(&self) {
        let id = self.context;
        self.thread.post(move |state| state.schedule_frame(id));
    }

    /// Blocks until every task this proxy posted so far has run.
    pub fn fence(&self) {
        self.thread.post_and_wait(|_| ());
    }

    /// Tears the render-thread side down. When this returns, no task of this
    /// proxy references the root scene any more. Idempotent.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        let id = self.context;
        self.thread.post_and_wait(move |state| {
            state.destroy_context(id);
        });
        self.root.destroy();
    }

    // --- Frames ---

    /// Commits the caller's pending state and draws one frame, blocking
    /// until both are done.
    ///
    /// `frame_info` must hold exactly [`UI_THREAD_FRAME_INFO_SIZE`] values;
    /// anything else is a build defect and aborts.
    pub fn sync_and_draw_frame(&self, frame_info: &[i64]) -> SyncResult {
        let Ok(info) = <[i64; UI_THREAD_FRAME_INFO_SIZE]>::try_from(frame_info) else {
            fatal!(
                "Frame info size mismatch: expected {UI_THREAD_FRAME_INFO_SIZE}, got {}",
                frame_info.len()
            );
        };
        let _guard = self.draw_lock.lock().unwrap();
        let queued_at = hwr_core::time::now_nanos();
        let id = self.context;
        self.thread
            .post_and_wait(move |state| state.sync_and_draw(id, &info, queued_at))
    }

    /// Prepares and draws `node` alone, without a caller sync.
    pub fn draw_render_node(&self, node: Arc<dyn RenderNode>) -> SyncResult {
        let _guard = self.draw_lock.lock().unwrap();
        let id = self.context;
        self.thread
            .post_and_wait(move |state| state.draw_node(id, &node))
    }

    /// Runs opaque work on the render thread with the backend current.
    pub fn invoke_functor(&self, functor: Box<dyn WorkerFunctor>, wait_for_completion: bool) {
        self.thread.invoke_functor(functor, wait_for_completion);
    }

    // --- Scene ---

    /// Queues a top-level node, drawn first when `place_front` is set.
    pub fn add_render_node(&self, node: Arc<dyn RenderNode>, place_front: bool) {
        let placement = if place_front {
            Placement::Front
        } else {
            Placement::Back
        };
        self.root.add_node(node, placement);
    }

    /// Queues the removal of a top-level node.
    pub fn remove_render_node(&self, id: NodeId) {
        self.root.remove_node(id);
    }

    // --- Settings ---

    /// Sets the shadow alphas, each in `0.0..=1.0`.
    pub fn set_light_alpha(&self, ambient: f32, spot: f32) {
        self.post(move |ctx| ctx.set_light_alpha(ambient, spot));
    }

    /// Sets the shadow light source.
    pub fn set_light_geometry(&self, center: Vec3, radius: f32) {
        self.post(move |ctx| ctx.set_light_geometry(center, radius));
    }

    /// Whether the content covers the whole surface.
    pub fn set_opaque(&self, opaque: bool) {
        self.post(move |ctx| ctx.set_opaque(opaque));
    }

    /// Enables wide-gamut rendering.
    pub fn set_wide_gamut(&self, wide_gamut: bool) {
        self.post(move |ctx| ctx.set_wide_gamut(wide_gamut));
    }

    /// Enables automatic dark theming.
    pub fn set_force_dark(&self, force_dark: bool) {
        self.post(move |ctx| ctx.set_force_dark(force_dark));
    }

    /// Sets the swap behavior of the surface.
    pub fn set_swap_behavior(&self, swap_behavior: SwapBehavior) {
        self.post(move |ctx| ctx.set_swap_behavior(swap_behavior));
    }

    /// Restricts drawing to a content area. An empty area lifts the clip.
    pub fn set_content_draw_bounds(&self, left: i32, top: i32, right: i32, bottom: i32) {
        let bounds = Rect::new(left, top, right, bottom);
        self.post(move |ctx| ctx.set_content_draw_bounds(bounds));
    }

    /// Re-reads the properties store. Returns whether anything changed.
    pub fn load_system_properties(&self) -> bool {
        self.thread.post_and_wait(|state| state.load_properties())
    }

    /// The identity of the render thread.
    pub fn render_thread_id(&self) -> Option<ThreadId> {
        self.thread.thread_id()
    }

    // --- Layers ---

    /// Records `node` and builds its layer ahead of the next frame.
    pub fn build_layer(&self, node: Arc<dyn RenderNode>) {
        self.post(move |ctx| ctx.build_layer(&node));
    }

    /// Creates a deferred texture layer.
    pub fn create_texture_layer(&self) -> Option<LayerId> {
        self.call(|ctx| ctx.layers_mut().create())
    }

    /// Connects a layer to the buffer queue feeding it.
    pub fn attach_layer_source(&self, layer: LayerId, source: Arc<dyn BufferConsumer>) {
        self.post(move |ctx| {
            ctx.layers_mut().attach_source(layer, source);
        });
    }

    /// Marks a layer as having new content, taken at the next sync.
    pub fn push_layer_update(&self, layer: LayerId) {
        self.post(move |ctx| {
            ctx.layers_mut().push_update(layer);
        });
    }

    /// Cancels a layer for good. Later pushes are ignored.
    pub fn cancel_layer_update(&self, layer: LayerId) {
        self.post(move |ctx| ctx.layers_mut().cancel_update(layer));
    }

    /// Severs a layer from its buffer queue. The layer itself survives.
    pub fn detach_surface_texture(&self, layer: LayerId) {
        self.post(move |ctx| ctx.layers_mut().detach(layer));
    }

    /// Releases a layer.
    pub fn destroy_layer(&self, layer: LayerId) {
        self.post(move |ctx| {
            ctx.layers_mut().destroy(layer);
        });
    }

    /// Copies the current content of a layer into `bitmap`.
    pub fn copy_layer_into(&self, layer: LayerId, bitmap: &mut PixelBuffer) -> bool {
        let mut target = bitmap.clone();
        let copied = self.call(move |ctx| {
            let ok = ctx.layers().copy_into(layer, &mut target);
            (ok, target)
        });
        match copied {
            Some((true, target)) => {
                *bitmap = target;
                true
            }
            _ => false,
        }
    }

    /// A diagnostic view of a layer.
    pub fn layer_info(&self, layer: LayerId) -> Option<LayerInfo> {
        self.call(move |ctx| ctx.layers().info(layer)).flatten()
    }

    /// Drops layer textures and backend caches.
    pub fn destroy_hardware_resources(&self) {
        self.post(RenderContext::destroy_hardware_resources);
    }

    // --- Listeners ---

    /// Replaces the listener called before each frame is drawn.
    pub fn set_frame_drawing_callback(&self, callback: Option<Arc<dyn FrameDrawingCallback>>) {
        self.post(move |ctx| ctx.callbacks_mut().set_frame_drawing(callback));
    }

    /// Replaces the one-shot listener called after the next presented frame.
    pub fn set_frame_complete_callback(&self, callback: Option<Arc<dyn FrameCompleteCallback>>) {
        self.post(move |ctx| ctx.callbacks_mut().set_frame_complete(callback));
    }

    /// Replaces the listener receiving captured pictures.
    pub fn set_picture_captured_callback(
        &self,
        callback: Option<Arc<dyn PictureCapturedCallback>>,
    ) {
        self.post(move |ctx| ctx.callbacks_mut().set_picture_captured(callback));
    }

    /// Captures the next presented frame as a picture.
    pub fn request_picture_capture(&self) {
        self.post(RenderContext::request_picture_capture);
    }

    /// Adds a frame metrics observer. Adding it twice has no effect.
    pub fn add_frame_metrics_observer(&self, observer: Arc<dyn FrameMetricsObserver>) {
        self.post(move |ctx| {
            ctx.callbacks_mut().add_metrics_observer(observer);
        });
    }

    /// Removes a frame metrics observer. Unknown observers are ignored.
    pub fn remove_frame_metrics_observer(&self, observer: Arc<dyn FrameMetricsObserver>) {
        self.post(move |ctx| {
            ctx.callbacks_mut().remove_metrics_observer(&observer);
        });
    }

    // --- Introspection ---

    /// The lifecycle state of the context.
    pub fn context_state(&self) -> ContextState {
        if self.destroyed.load(Ordering::Acquire) {
            return ContextState::Destroyed;
        }
        self.call(|ctx| ctx.state())
            .unwrap_or(ContextState::Destroyed)
    }

    /// Counts of the committed scene.
    pub fn scene_stats(&self) -> SceneStats {
        self.call(|ctx| ctx.scene_stats()).unwrap_or_default()
    }

    /// The jank statistics of this context. [`DumpFlags::RESET`] clears them.
    pub fn dump_profile_info(&self, flags: DumpFlags) -> String {
        self.call(move |ctx| ctx.dump_profile_info(flags))
            .unwrap_or_default()
    }
}

impl Drop for RenderProxy {
    fn drop(&mut self) {
        if self.destroyed.load(Ordering::Acquire) {
            return;
        }
        if self.thread.is_current() {
            let id = self.context;
            self.destroyed.store(true, Ordering::Release);
            self.thread.post(move |state| {
                state.destroy_context(id);
            });
            self.root.destroy();
        } else if self.thread.is_running() {
            self.destroy();
        } else {
            log::warn!("Render proxy dropped after its render thread stopped");
        }
    }
}

impl std::fmt::Debug for RenderProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderProxy")
            .field("context", &self.context)
            .field("root", &self.root.name())
            .finish_non_exhaustive()
    }
}
