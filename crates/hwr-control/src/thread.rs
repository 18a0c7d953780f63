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

//! The render thread runtime.
//!
//! One [`RenderThread`] owns one OS thread and every piece of graphics state.
//! Callers never touch that state; they send tasks through a channel and,
//! when they need an answer, block on a one-shot reply channel.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use hwr_core::backend::{ContextOptions, GraphicsBackend, TrimLevel, WorkerFunctor};
use hwr_core::properties::{PropertiesStore, RenderProperties, ShaderCache};
use hwr_core::runtime::CallerRuntime;
use hwr_core::scene::RenderNode;
use hwr_core::{fatal, HandleArena, RenderError, SyncResult, UI_THREAD_FRAME_INFO_SIZE};
use hwr_data::RootScene;
use hwr_telemetry::{JankTracker, ProcessStats};

use crate::config::RenderThreadConfig;
use crate::context::{ContextId, RenderContext};
use crate::scheduler::FrameScheduler;

type Task = Box<dyn FnOnce(&mut WorkerState) + Send>;

enum Message {
    Task(Task),
    Shutdown,
}

/// The collaborators moved onto the render thread at startup.
pub struct WorkerServices {
    /// The graphics backend. Lives on the render thread from start to stop.
    pub backend: Box<dyn GraphicsBackend>,
    /// The environment listeners run in.
    pub caller_runtime: Arc<dyn CallerRuntime>,
    /// The process-wide properties store.
    pub properties: Arc<dyn PropertiesStore>,
    /// The on-disk cache of compiled shader programs.
    pub program_cache: Arc<dyn ShaderCache>,
    /// The on-disk cache of compiled pipelines.
    pub pipeline_cache: Arc<dyn ShaderCache>,
}

/// Everything owned by the render thread.
///
/// Only reachable from inside a task.
pub struct WorkerState {
    backend: Box<dyn GraphicsBackend>,
    contexts: HandleArena<RenderContext>,
    store: Arc<dyn PropertiesStore>,
    properties: RenderProperties,
    scheduler: FrameScheduler<ContextId>,
    process_stats: ProcessStats,
}

impl WorkerState {
    fn new(
        backend: Box<dyn GraphicsBackend>,
        store: Arc<dyn PropertiesStore>,
        config: &RenderThreadConfig,
    ) -> Self {
        let mut properties = RenderProperties::default();
        properties.load(store.as_ref());
        Self {
            backend,
            contexts: HandleArena::new(),
            store,
            properties,
            scheduler: FrameScheduler::new(config.frame_interval(), config.vsync_enabled),
            process_stats: ProcessStats::new(config.frame_interval()),
        }
    }

    /// Creates a render context bound to `root`.
    pub fn create_context(
        &mut self,
        translucent: bool,
        root: Arc<RootScene>,
    ) -> Result<ContextId, RenderError> {
        let options = ContextOptions {
            translucent,
            name: root.name().to_owned(),
        };
        let gpu = self.backend.create_context(&options)?;
        let jank = JankTracker::new(self.scheduler.interval());
        let id = self
            .contexts
            .insert(RenderContext::new(options.name, translucent, gpu, root, jank));
        log::info!(
            "Created context {id:?} on backend '{}' (translucent: {translucent})",
            self.backend.name()
        );
        Ok(id)
    }

    /// The context behind `id`, if it is alive.
    pub fn context(&self, id: ContextId) -> Option<&RenderContext> {
        self.contexts.get(id)
    }

    /// Mutable access to the context behind `id`.
    pub fn context_mut(&mut self, id: ContextId) -> Option<&mut RenderContext> {
        let context = self.contexts.get_mut(id);
        if context.is_none() {
            log::warn!("Invalid context handle {id:?}");
        }
        context
    }

    /// Destroys a context and forgets its handle.
    pub fn destroy_context(&mut self, id: ContextId) -> bool {
        self.scheduler.cancel(id);
        match self.contexts.remove(id) {
            Some(mut context) => {
                context.destroy();
                true
            }
            None => false,
        }
    }

    /// Runs the sync and draw of one frame.
    pub fn sync_and_draw(
        &mut self,
        id: ContextId,
        ui_info: &[i64; UI_THREAD_FRAME_INFO_SIZE],
        queued_at: i64,
    ) -> SyncResult {
        let Some(context) = self.contexts.get_mut(id) else {
            log::warn!("sync_and_draw on invalid context {id:?}");
            return SyncResult::FRAME_DROPPED;
        };
        context.sync_and_draw(ui_info, queued_at, &self.properties, &mut self.process_stats)
    }

    /// Draws one node into the context's surface without a caller sync.
    pub fn draw_node(&mut self, id: ContextId, node: &Arc<dyn RenderNode>) -> SyncResult {
        let Some(context) = self.contexts.get_mut(id) else {
            log::warn!("draw_node on invalid context {id:?}");
            return SyncResult::FRAME_DROPPED;
        };
        context.draw_node(node, &self.properties, &mut self.process_stats)
    }

    /// Requests a render-thread frame on the next vsync tick.
    pub fn schedule_frame(&mut self, id: ContextId) {
        if self.contexts.contains(id) {
            self.scheduler.schedule(id);
        }
    }

    /// Withdraws a requested render-thread frame.
    pub fn cancel_frame(&mut self, id: ContextId) -> bool {
        self.scheduler.cancel(id)
    }

    /// Whether a render-thread frame is requested for `id`.
    pub fn is_frame_scheduled(&self, id: ContextId) -> bool {
        self.scheduler.is_scheduled(id)
    }

    /// The backend.
    pub fn backend_mut(&mut self) -> &mut dyn GraphicsBackend {
        self.backend.as_mut()
    }

    /// The current tunables.
    pub fn properties(&self) -> &RenderProperties {
        &self.properties
    }

    /// Mutable access to the tunables.
    pub fn properties_mut(&mut self) -> &mut RenderProperties {
        &mut self.properties
    }

    /// Re-reads the properties store. Returns whether anything changed.
    pub fn load_properties(&mut self) -> bool {
        self.properties.load(self.store.as_ref())
    }

    /// Releases memory in the backend and, at the highest level, in every
    /// context.
    pub fn trim_memory(&mut self, level: TrimLevel) {
        log::info!("Trimming memory: {level:?}");
        self.backend.trim_memory(level);
        if level == TrimLevel::Complete {
            for (_, context) in self.contexts.iter_mut() {
                context.destroy_hardware_resources();
            }
        }
    }

    /// Formats the process-wide statistics.
    pub fn dump_process_stats(&mut self) -> String {
        let mut out = self.process_stats.dump();
        let backend = self.backend.dump_stats();
        if !backend.is_empty() {
            out.push_str(&backend);
        }
        out
    }

    /// Starts a new process statistics period.
    pub fn rotate_process_stats(&mut self) {
        self.process_stats.rotate();
    }

    /// Stops pacing render-thread frames on vsync.
    pub fn disable_vsync(&mut self) {
        self.scheduler.disable_vsync();
    }

    fn dispatch_vsync(&mut self, now: Instant) {
        let vsync_nanos = hwr_core::time::now_nanos();
        for id in self.scheduler.take_due(now) {
            let Some(context) = self.contexts.get_mut(id) else {
                continue;
            };
            let animating = context.draw_render_thread_frame(
                vsync_nanos,
                &self.properties,
                &mut self.process_stats,
            );
            if animating {
                self.scheduler.schedule(id);
            }
        }
    }

    fn shutdown(&mut self) {
        let leaked = self.contexts.drain();
        if !leaked.is_empty() {
            log::warn!("Destroying {} contexts still alive at shutdown", leaked.len());
        }
        for mut context in leaked {
            context.destroy();
        }
    }
}

// Clears the running flag however the worker exits, panics included.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
        if thread::panicking() {
            log::error!("Render thread terminated by a panic");
        }
    }
}

/// The render thread.
///
/// Created once and shared as an `Arc` by every proxy. Tasks run one at a
/// time, in the order they were posted.
pub struct RenderThread {
    config: RenderThreadConfig,
    sender: Sender<Message>,
    receiver: Mutex<Option<Receiver<Message>>>,
    services: Mutex<Option<WorkerServices>>,
    properties: Arc<dyn PropertiesStore>,
    program_cache: Arc<dyn ShaderCache>,
    pipeline_cache: Arc<dyn ShaderCache>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: OnceLock<ThreadId>,
}

impl RenderThread {
    /// Creates a render thread. Nothing runs until [`start`](Self::start).
    pub fn new(config: RenderThreadConfig, services: WorkerServices) -> Arc<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Arc::new(Self {
            config,
            sender,
            receiver: Mutex::new(Some(receiver)),
            properties: services.properties.clone(),
            program_cache: services.program_cache.clone(),
            pipeline_cache: services.pipeline_cache.clone(),
            services: Mutex::new(Some(services)),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            thread_id: OnceLock::new(),
        })
    }

    /// The configuration the thread was created with.
    pub fn config(&self) -> &RenderThreadConfig {
        &self.config
    }

    /// Spawns the thread. Before running any task it attaches itself to the
    /// caller runtime; a failed attach is fatal. A stopped thread cannot be
    /// started again.
    pub fn start(&self) -> io::Result<()> {
        if self.is_running() {
            return Ok(());
        }
        let (Some(receiver), Some(services)) = (
            self.receiver.lock().unwrap().take(),
            self.services.lock().unwrap().take(),
        ) else {
            return Err(io::Error::other("render thread cannot be restarted"));
        };

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let config = self.config.clone();

        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || {
                let _guard = RunningGuard(running);
                let WorkerServices {
                    backend,
                    caller_runtime,
                    properties,
                    ..
                } = services;
                if let Err(e) = caller_runtime.attach_current_thread(&config.thread_name) {
                    fatal!("{e}");
                }
                log::info!("Render thread '{}' started", config.thread_name);

                let mut state = WorkerState::new(backend, properties, &config);
                run_loop(&mut state, &receiver);
                state.shutdown();

                caller_runtime.detach_current_thread();
                log::info!("Render thread '{}' stopped", config.thread_name);
            });

        match spawned {
            Ok(handle) => {
                let _ = self.thread_id.set(handle.thread().id());
                *self.handle.lock().unwrap() = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Asks the thread to exit after the tasks already posted, and joins it.
    pub fn stop(&self) {
        if self.sender.send(Message::Shutdown).is_err() {
            log::debug!("Render thread already gone");
        }
        if self.is_current() {
            return;
        }
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Whether the thread is alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The id of the OS thread, once started.
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.thread_id.get().copied()
    }

    /// Whether the caller is the render thread itself.
    pub fn is_current(&self) -> bool {
        self.thread_id() == Some(thread::current().id())
    }

    /// Queues a task and returns immediately.
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce(&mut WorkerState) + Send + 'static,
    {
        if self.sender.send(Message::Task(Box::new(task))).is_err() {
            log::warn!("Render thread is gone, dropping task");
        }
    }

    /// Queues a task and blocks until it ran, returning its result.
    ///
    /// Calling this while the thread is not running, or from the render
    /// thread itself, is fatal. So is the render thread dying before the task
    /// completes.
    pub fn post_and_wait<R, F>(&self, task: F) -> R
    where
        F: FnOnce(&mut WorkerState) -> R + Send + 'static,
        R: Send + 'static,
    {
        if !self.is_running() {
            fatal!("post_and_wait on a render thread that is not running");
        }
        if self.is_current() {
            fatal!("post_and_wait called from the render thread");
        }
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.post(move |state| {
            let _ = reply_tx.send(task(state));
        });
        match reply_rx.recv() {
            Ok(result) => result,
            Err(_) => fatal!("render thread terminated before completing a task"),
        }
    }

    /// Runs opaque work on the render thread with the backend current.
    pub fn invoke_functor(&self, functor: Box<dyn WorkerFunctor>, wait_for_completion: bool) {
        let task = move |state: &mut WorkerState| functor.run(state.backend_mut());
        if wait_for_completion {
            self.post_and_wait(task);
        } else {
            self.post(task);
        }
    }

    /// Releases memory according to `level`.
    pub fn trim_memory(&self, level: TrimLevel) {
        self.post(move |state| state.trim_memory(level));
    }

    /// Overrides a value of the properties store. Picked up by the next
    /// properties load.
    pub fn override_property(&self, key: &str, value: &str) {
        log::debug!("Overriding property {key}={value}");
        self.properties.set_override(key, value);
    }

    /// Points the shader caches at their backing files.
    pub fn setup_shaders_disk_cache(&self, program_cache: &Path, pipeline_cache: &Path) {
        self.program_cache.set_path(program_cache);
        self.pipeline_cache.set_path(pipeline_cache);
    }

    /// Renders text with maximum contrast.
    pub fn set_high_contrast_text(&self, enabled: bool) {
        self.post(move |state| state.properties_mut().high_contrast_text = enabled);
    }

    /// Allows animations to run on the render thread alone.
    pub fn set_rt_animations_enabled(&self, enabled: bool) {
        self.post(move |state| state.properties_mut().render_thread_animations = enabled);
    }

    /// Enables debug layers.
    pub fn set_debugging_enabled(&self, enabled: bool) {
        self.post(move |state| state.properties_mut().debugging_enabled = enabled);
    }

    /// Marks the process as isolated.
    pub fn set_isolated_process(&self, isolated: bool) {
        self.post(move |state| state.properties_mut().isolated_process = isolated);
    }

    /// Sets the graphics context priority hint.
    pub fn set_context_priority(&self, priority: i32) {
        self.post(move |state| state.properties_mut().context_priority = priority);
    }

    /// Runs render-thread frames as soon as they are requested.
    pub fn disable_vsync(&self) {
        self.post(WorkerState::disable_vsync);
    }

    /// Warms up backend caches.
    pub fn preload(&self) {
        self.post(|state| state.backend_mut().preload());
    }

    /// Formats the process-wide statistics.
    pub fn process_stats(&self) -> String {
        self.post_and_wait(WorkerState::dump_process_stats)
    }

    /// Starts a new process statistics period.
    pub fn rotate_process_stats(&self) {
        self.post(WorkerState::rotate_process_stats);
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(state: &mut WorkerState, receiver: &Receiver<Message>) {
    loop {
        if state.scheduler.is_due(Instant::now()) {
            state.dispatch_vsync(Instant::now());
        }
        let message = match state.scheduler.deadline() {
            Some(deadline) => match receiver.recv_deadline(deadline) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return,
            },
            None => match receiver.recv() {
                Ok(message) => message,
                Err(_) => return,
            },
        };
        match message {
            Message::Task(task) => task(state),
            Message::Shutdown => return,
        }
    }
}
