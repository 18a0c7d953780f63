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
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hwr_control::{RenderThread, RenderThreadConfig, WorkerServices};
use hwr_core::backend::{ContextOptions, GraphicsBackend, GraphicsContext, TrimLevel};
use hwr_core::properties::{PropertiesStore, RenderProperties, ShaderCache};
use hwr_core::runtime::CallerRuntime;
use hwr_core::scene::SceneSnapshot;
use hwr_core::surface::PresentationSurface;
use hwr_core::{AttachError, DrawOutcome, ErrorReporter, RenderError};
use hwr_data::RootScene;

// --- STUB COLLABORATORS ---

struct NullContext;

impl GraphicsContext for NullContext {
    fn bind_surface(
        &mut self,
        _surface: Option<Arc<dyn PresentationSurface>>,
    ) -> Result<(), RenderError> {
        Ok(())
    }
    fn has_surface(&self) -> bool {
        false
    }
    fn draw(&mut self, _snapshot: &SceneSnapshot) -> Result<DrawOutcome, RenderError> {
        Ok(DrawOutcome::Presented)
    }
    fn destroy_hardware_resources(&mut self) {}
    fn release(&mut self) {}
}

#[derive(Default)]
struct NullBackend {
    trims: Arc<Mutex<Vec<TrimLevel>>>,
}

impl GraphicsBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }
    fn create_context(
        &mut self,
        _options: &ContextOptions,
    ) -> Result<Box<dyn GraphicsContext>, RenderError> {
        Ok(Box::new(NullContext))
    }
    fn trim_memory(&mut self, level: TrimLevel) {
        self.trims.lock().unwrap().push(level);
    }
}

struct CountingRuntime {
    attached: AtomicUsize,
    fail: bool,
}

impl CallerRuntime for CountingRuntime {
    fn attach_current_thread(&self, thread_name: &str) -> Result<(), AttachError> {
        self.attached.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AttachError {
                thread_name: thread_name.to_owned(),
                reason: "no runtime".to_owned(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
struct MapStore(Mutex<HashMap<String, String>>);

impl PropertiesStore for MapStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key).cloned()
    }
    fn set_override(&self, key: &str, value: &str) {
        self.0.lock().unwrap().insert(key.to_owned(), value.to_owned());
    }
}

#[derive(Default)]
struct PathCache(Mutex<Option<std::path::PathBuf>>);

impl ShaderCache for PathCache {
    fn set_path(&self, path: &Path) {
        *self.0.lock().unwrap() = Some(path.to_path_buf());
    }
}

struct SilentReporter;

impl ErrorReporter for SilentReporter {
    fn on_error(&self, _message: &str) {}
}

struct Fixture {
    thread: Arc<RenderThread>,
    runtime: Arc<CountingRuntime>,
    trims: Arc<Mutex<Vec<TrimLevel>>>,
    program_cache: Arc<PathCache>,
}

fn fixture(fail_attach: bool) -> Fixture {
    let backend = NullBackend::default();
    let trims = backend.trims.clone();
    let runtime = Arc::new(CountingRuntime {
        attached: AtomicUsize::new(0),
        fail: fail_attach,
    });
    let program_cache = Arc::new(PathCache::default());
    let services = WorkerServices {
        backend: Box::new(backend),
        caller_runtime: runtime.clone(),
        properties: Arc::new(MapStore::default()),
        program_cache: program_cache.clone(),
        pipeline_cache: Arc::new(PathCache::default()),
    };
    let thread = RenderThread::new(RenderThreadConfig::default(), services);
    thread.start().expect("render thread should start");
    Fixture {
        thread,
        runtime,
        trims,
        program_cache,
    }
}

// --- TESTS ---

#[test]
fn test_posted_tasks_run_in_submission_order() {
    // --- 1. ARRANGE ---
    let fx = fixture(false);
    let seen = Arc::new(Mutex::new(Vec::new()));

    // --- 2. ACT ---
    for i in 0..100 {
        let seen = seen.clone();
        fx.thread.post(move |_| seen.lock().unwrap().push(i));
    }
    fx.thread.post_and_wait(|_| ());

    // --- 3. ASSERT ---
    let seen = seen.lock().unwrap();
    assert_eq!(*seen, (0..100).collect::<Vec<_>>(), "Tasks must run FIFO");
}

#[test]
fn test_post_and_wait_returns_task_result_on_the_render_thread() {
    let fx = fixture(false);

    let (value, thread_id) = fx
        .thread
        .post_and_wait(|_| (21 * 2, std::thread::current().id()));

    assert_eq!(value, 42);
    assert_eq!(Some(thread_id), fx.thread.thread_id());
    assert!(!fx.thread.is_current());
}

#[test]
fn test_attach_hook_runs_once_before_tasks() {
    let fx = fixture(false);
    let runtime = fx.runtime.clone();

    let attached_when_running = fx
        .thread
        .post_and_wait(move |_| runtime.attached.load(Ordering::SeqCst));
    fx.thread.post_and_wait(|_| ());

    assert_eq!(attached_when_running, 1);
    assert_eq!(fx.runtime.attached.load(Ordering::SeqCst), 1);
}

#[test]
#[should_panic]
fn test_failed_attach_is_fatal_for_callers() {
    let fx = fixture(true);
    fx.thread.post_and_wait(|_| ());
}

#[test]
#[should_panic(expected = "render thread")]
fn test_worker_panic_reaches_blocked_caller() {
    let fx = fixture(false);
    // Give the queue a task that dies, then one the caller waits on.
    fx.thread.post(|_| panic!("graphics corrupted"));
    std::thread::sleep(Duration::from_millis(50));
    let running = fx.thread.is_running();
    assert!(!running, "Worker should have terminated");
    fx.thread.post_and_wait(|_| ());
}

#[test]
#[should_panic(expected = "render thread")]
fn test_task_queued_behind_a_panic_is_dropped() {
    let fx = fixture(false);
    let gate = Arc::new(std::sync::Barrier::new(2));
    let worker_gate = gate.clone();
    fx.thread.post(move |_| {
        worker_gate.wait();
        panic!("graphics corrupted");
    });
    // Queue the waiting task while the worker is still alive.
    let thread = fx.thread.clone();
    let waiter = std::thread::spawn(move || thread.post_and_wait(|_| ()));
    std::thread::sleep(Duration::from_millis(20));
    gate.wait();
    if let Err(payload) = waiter.join() {
        std::panic::resume_unwind(payload);
    }
}

#[test]
fn test_stop_joins_and_refuses_restart() {
    let fx = fixture(false);
    let done = Arc::new(AtomicUsize::new(0));
    let d = done.clone();
    fx.thread.post(move |_| {
        d.fetch_add(1, Ordering::SeqCst);
    });

    fx.thread.stop();

    assert_eq!(done.load(Ordering::SeqCst), 1, "Queued tasks run before shutdown");
    assert!(!fx.thread.is_running());
    assert!(fx.thread.start().is_err());
}

#[test]
fn test_render_thread_frame_runs_without_vsync() {
    let fx = fixture(false);
    let root = RootScene::new("vsync", Box::new(SilentReporter));
    let id = fx
        .thread
        .post_and_wait(move |state| state.create_context(false, root))
        .expect("context creation");

    fx.thread.disable_vsync();
    fx.thread.post(move |state| state.schedule_frame(id));
    let scheduled_after = fx.thread.post_and_wait(move |state| state.is_frame_scheduled(id));

    assert!(!scheduled_after, "The frame should have been dispatched");
}

#[test]
fn test_pause_cancels_a_scheduled_frame() {
    let fx = fixture(false);
    let root = RootScene::new("pause", Box::new(SilentReporter));
    let id = fx
        .thread
        .post_and_wait(move |state| state.create_context(false, root))
        .expect("context creation");

    let canceled = fx.thread.post_and_wait(move |state| {
        state.schedule_frame(id);
        state.cancel_frame(id)
    });
    let again = fx.thread.post_and_wait(move |state| state.cancel_frame(id));

    assert!(canceled);
    assert!(!again);
}

#[test]
fn test_process_wide_operations() {
    let fx = fixture(false);

    fx.thread.trim_memory(TrimLevel::Complete);
    fx.thread.set_high_contrast_text(true);
    fx.thread.set_context_priority(3);
    fx.thread.override_property(RenderProperties::PROFILE_KEY, "true");
    fx.thread
        .setup_shaders_disk_cache(Path::new("/tmp/programs"), Path::new("/tmp/pipelines"));
    let (props, changed) = fx
        .thread
        .post_and_wait(|state| {
            let changed = state.load_properties();
            (state.properties().clone(), changed)
        });

    assert_eq!(*fx.trims.lock().unwrap(), vec![TrimLevel::Complete]);
    assert!(props.high_contrast_text);
    assert_eq!(props.context_priority, 3);
    assert!(changed && props.profiling);
    assert_eq!(
        fx.program_cache.0.lock().unwrap().as_deref(),
        Some(Path::new("/tmp/programs"))
    );
    assert!(fx.thread.process_stats().contains("frames"));
}
