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

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hwr_core::backend::GraphicsBackend;
use hwr_core::callback::{FrameMetrics, FrameMetricsObserver, Picture};
use hwr_core::surface::BufferConsumer;
use hwr_data::LayerState;
use hwr_sdk::prelude::*;

// --- HELPERS ---

struct Harness {
    thread: Arc<RenderThread>,
    proxy: RenderProxy,
    surface: Arc<hwr_infra::QueueSurface>,
}

fn harness_with(config: RenderThreadConfig) -> Harness {
    let thread = software_render_thread(config).expect("render thread should start");
    let root = RootScene::new("test", Box::new(LogErrorReporter::new()));
    let proxy = RenderProxy::new(thread.clone(), false, root).expect("proxy creation");
    let (surface, _consumer) = BufferQueue::create("window", 4, 4, 3);
    proxy.set_surface(Some(surface.clone() as Arc<dyn PresentationSurface>));
    Harness {
        thread,
        proxy,
        surface,
    }
}

fn harness() -> Harness {
    harness_with(RenderThreadConfig::default())
}

fn frame_info() -> [i64; UI_THREAD_FRAME_INFO_SIZE] {
    let now = hwr_core::time::now_nanos();
    UiFrameInfoBuilder::new().set_vsync(now, now).build()
}

fn filled(name: &str, rect: Rect, color: u32) -> Arc<RecordedNode> {
    let mut list = DisplayList::new();
    list.push(DrawOp::FillRect { rect, color });
    RecordedNode::with_display_list(name, list)
}

#[derive(Default)]
struct CountingObserver(AtomicUsize);

impl FrameMetricsObserver for CountingObserver {
    fn on_frame_metrics(&self, _metrics: &FrameMetrics) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

// --- SCENARIOS ---

#[test]
fn test_two_top_level_nodes_need_no_redraw() {
    // --- 1. ARRANGE ---
    let h = harness();
    let front = filled("front", Rect::new(0, 0, 4, 4), 0xff00_00ff);
    let back = filled("back", Rect::new(0, 0, 1, 1), 0xffff_0000);
    h.proxy.add_render_node(front, true);
    h.proxy.add_render_node(back, false);

    // --- 2. ACT ---
    let result = h.proxy.sync_and_draw_frame(&frame_info());

    // --- 3. ASSERT ---
    assert!(result.is_empty(), "No redraw should be requested, got {result:?}");
    let stats = h.proxy.scene_stats();
    assert_eq!((stats.front_nodes, stats.back_nodes), (1, 1));
    assert_eq!(stats.pending_ops, 0);

    let frame = h.surface.read_back().expect("a frame was presented");
    assert_eq!(frame.pixel(0, 0), Some(0xffff_0000), "Back node draws last");
    assert_eq!(frame.pixel(3, 3), Some(0xff00_00ff));
}

#[test]
fn test_animating_node_leaves_the_set_once_finished() {
    let h = harness();
    let node = RecordedNode::new("spinner");
    node.animate_for_frames(2);
    let node: Arc<dyn RenderNode> = node;
    h.proxy.add_render_node(node.clone(), false);
    h.proxy.root().attach_animating_node(&node);

    let first = h.proxy.sync_and_draw_frame(&frame_info());
    assert!(first.contains(SyncResult::REDRAW_REQUIRED));
    assert_eq!(h.proxy.scene_stats().animating_nodes, 1);

    let second = h.proxy.sync_and_draw_frame(&frame_info());
    assert!(!second.contains(SyncResult::REDRAW_REQUIRED));
    assert_eq!(h.proxy.scene_stats().animating_nodes, 0);

    let third = h.proxy.sync_and_draw_frame(&frame_info());
    assert!(third.is_empty());
    assert_eq!(h.proxy.scene_stats().animating_nodes, 0);
}

#[test]
fn test_render_thread_frames_finish_animations() {
    let h = harness();
    let node = RecordedNode::new("fade");
    node.animate_for_frames(3);
    let node: Arc<dyn RenderNode> = node;
    h.proxy.add_render_node(node.clone(), false);
    h.proxy.root().attach_animating_node(&node);
    assert!(h
        .proxy
        .sync_and_draw_frame(&frame_info())
        .contains(SyncResult::REDRAW_REQUIRED));

    h.thread.disable_vsync();
    h.proxy.notify_frame_pending();
    h.proxy.fence();

    assert_eq!(h.proxy.scene_stats().animating_nodes, 0);
}

// --- PROPERTIES ---

#[test]
fn test_posted_tasks_keep_submission_order() {
    let h = harness();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for i in 0..50 {
        let seen = seen.clone();
        h.proxy.invoke_functor(
            Box::new(move |_: &mut dyn GraphicsBackend| seen.lock().unwrap().push(i)),
            false,
        );
    }
    h.proxy.fence();

    assert_eq!(*seen.lock().unwrap(), (0..50).collect::<Vec<_>>());
}

#[test]
fn test_destroy_waits_for_queued_tasks() {
    let h = harness();
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();
    h.proxy.invoke_functor(
        Box::new(move |_: &mut dyn GraphicsBackend| {
            std::thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
        }),
        false,
    );

    h.proxy.destroy();

    assert!(finished.load(Ordering::SeqCst), "Deferred task must complete first");
    assert_eq!(h.proxy.context_state(), ContextState::Destroyed);
    assert!(h.proxy.root().is_destroyed());
    assert!(!h.surface.is_connected(), "Surface released with the context");
    h.proxy.destroy();
}

#[test]
fn test_sync_calls_from_many_threads_are_serialized() {
    let h = harness();
    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = frames.clone();
    h.proxy
        .set_frame_drawing_callback(Some(Arc::new(move |n: u64| sink.lock().unwrap().push(n))));
    let proxy = Arc::new(h.proxy);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let proxy = proxy.clone();
            std::thread::spawn(move || {
                for _ in 0..10 {
                    assert!(proxy.sync_and_draw_frame(&frame_info()).is_empty());
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 40);
    assert!(frames.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_second_sync_waits_for_the_first_to_return() {
    // --- 1. ARRANGE ---
    let h = harness();
    let events = Arc::new(Mutex::new(Vec::<String>::new()));
    let (entered_tx, entered_rx) = std::sync::mpsc::channel::<()>();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let blocked_once = AtomicBool::new(false);
    let sink = events.clone();
    h.proxy.set_frame_drawing_callback(Some(Arc::new(move |n: u64| {
        sink.lock().unwrap().push(format!("frame {n}"));
        if !blocked_once.swap(true, Ordering::SeqCst) {
            entered_tx.send(()).unwrap();
            release_rx.lock().unwrap().recv().unwrap();
        }
    })));
    let proxy = Arc::new(h.proxy);

    // --- 2. ACT ---
    let first = {
        let proxy = proxy.clone();
        std::thread::spawn(move || proxy.sync_and_draw_frame(&frame_info()))
    };
    entered_rx.recv().unwrap();
    let second = {
        let proxy = proxy.clone();
        std::thread::spawn(move || proxy.sync_and_draw_frame(&frame_info()))
    };
    std::thread::sleep(Duration::from_millis(50));

    // Posted while the first frame is still drawing and the second caller is
    // already inside `sync_and_draw_frame`.
    let sink = events.clone();
    proxy.invoke_functor(
        Box::new(move |_: &mut dyn GraphicsBackend| {
            sink.lock().unwrap().push("marker".to_owned());
        }),
        false,
    );
    release_tx.send(()).unwrap();
    first.join().unwrap();
    second.join().unwrap();

    // --- 3. ASSERT ---
    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec!["frame 1".to_owned(), "marker".to_owned(), "frame 2".to_owned()],
        "The second sync must not be queued before the first returns"
    );
}

#[test]
#[should_panic(expected = "Frame info size mismatch")]
fn test_wrong_frame_info_length_is_fatal() {
    let h = harness();
    h.proxy.sync_and_draw_frame(&[0; UI_THREAD_FRAME_INFO_SIZE + 1]);
}

#[test]
fn test_metrics_observer_registration_is_idempotent() {
    let h = harness();
    let counter = Arc::new(CountingObserver::default());
    let observer: Arc<dyn FrameMetricsObserver> = counter.clone();
    let stranger: Arc<dyn FrameMetricsObserver> = Arc::new(CountingObserver::default());

    h.proxy.add_frame_metrics_observer(observer.clone());
    h.proxy.add_frame_metrics_observer(observer.clone());
    h.proxy.remove_frame_metrics_observer(stranger);
    h.proxy.sync_and_draw_frame(&frame_info());
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);

    h.proxy.remove_frame_metrics_observer(observer);
    h.proxy.sync_and_draw_frame(&frame_info());
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
}

#[test]
fn test_frame_complete_fires_once_per_registration() {
    let h = harness();
    let fired = Arc::new(AtomicUsize::new(0));
    let count = fired.clone();
    h.proxy.set_frame_complete_callback(Some(Arc::new(move |_: u64| {
        count.fetch_add(1, Ordering::SeqCst);
    })));

    h.proxy.sync_and_draw_frame(&frame_info());
    h.proxy.sync_and_draw_frame(&frame_info());

    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_requested_picture_is_delivered() {
    let h = harness();
    let pictures = Arc::new(Mutex::new(Vec::<Picture>::new()));
    let sink = pictures.clone();
    h.proxy
        .set_picture_captured_callback(Some(Arc::new(move |p: Picture| {
            sink.lock().unwrap().push(p)
        })));
    h.proxy
        .add_render_node(filled("content", Rect::new(0, 0, 2, 2), 1), false);

    h.proxy.sync_and_draw_frame(&frame_info());
    h.proxy.request_picture_capture();
    h.proxy.sync_and_draw_frame(&frame_info());
    h.proxy.sync_and_draw_frame(&frame_info());

    let pictures = pictures.lock().unwrap();
    assert_eq!(pictures.len(), 1, "Only the requested frame is captured");
    assert_eq!(pictures[0].frame_number, 2);
    assert_eq!(pictures[0].nodes.len(), 1);
}

#[test]
fn test_canceled_layer_never_presents() {
    let h = harness();
    let (producer, consumer) = BufferQueue::create("video", 2, 2, 2);
    producer.connect().unwrap();
    let mut item = producer.dequeue_buffer().unwrap();
    item.buffer.as_mut().unwrap().fill(0xff44_4444);
    producer.queue_buffer(item).unwrap();

    let layer = h.proxy.create_texture_layer().expect("layer");
    h.proxy
        .attach_layer_source(layer, consumer.clone() as Arc<dyn BufferConsumer>);
    h.proxy.cancel_layer_update(layer);
    h.proxy.push_layer_update(layer);
    h.proxy.sync_and_draw_frame(&frame_info());

    let info = h.proxy.layer_info(layer).expect("layer still exists");
    assert_eq!(info.state, LayerState::Canceled);
    assert_eq!(info.updates_applied, 0);
    let mut bitmap = PixelBuffer::new(2, 2);
    assert!(!h.proxy.copy_layer_into(layer, &mut bitmap));
    assert_eq!(consumer.pending(), 1, "The queued buffer was never taken");
}

#[test]
fn test_pushed_layer_update_is_taken_at_sync() {
    let h = harness();
    let (producer, consumer) = BufferQueue::create("camera", 2, 2, 2);
    producer.connect().unwrap();
    let mut item = producer.dequeue_buffer().unwrap();
    item.buffer.as_mut().unwrap().fill(0xff44_4444);
    producer.queue_buffer(item).unwrap();

    let layer = h.proxy.create_texture_layer().expect("layer");
    h.proxy.attach_layer_source(layer, consumer);
    h.proxy.push_layer_update(layer);
    h.proxy.sync_and_draw_frame(&frame_info());

    let mut bitmap = PixelBuffer::new(2, 2);
    assert!(h.proxy.copy_layer_into(layer, &mut bitmap));
    assert_eq!(bitmap.pixels, vec![0xff44_4444; 4]);
    assert_eq!(h.proxy.layer_info(layer).unwrap().updates_applied, 1);

    h.proxy.destroy_layer(layer);
    assert!(h.proxy.layer_info(layer).is_none());
}

#[test]
fn test_detached_layer_ignores_pushes() {
    let h = harness();
    let (_producer, consumer) = BufferQueue::create("detached", 2, 2, 2);
    let layer = h.proxy.create_texture_layer().expect("layer");
    h.proxy.attach_layer_source(layer, consumer);

    h.proxy.detach_surface_texture(layer);
    h.proxy.push_layer_update(layer);
    h.proxy.sync_and_draw_frame(&frame_info());

    let info = h.proxy.layer_info(layer).expect("layer survives detach");
    assert_eq!(info.state, LayerState::Detached);
    assert!(!info.update_pending);
}

#[test]
fn test_layer_handle_from_another_proxy_is_rejected() {
    // --- 1. ARRANGE ---
    let h = harness();
    let root = RootScene::new("other", Box::new(LogErrorReporter::new()));
    let other = RenderProxy::new(h.thread.clone(), false, root).expect("proxy creation");
    let (_producer, consumer) = BufferQueue::create("own", 2, 2, 2);
    let foreign = h.proxy.create_texture_layer().expect("layer");
    let own = other.create_texture_layer().expect("layer");
    other.attach_layer_source(own, consumer);

    // --- 2. ACT ---
    other.cancel_layer_update(foreign);
    other.detach_surface_texture(foreign);
    other.destroy_layer(foreign);

    // --- 3. ASSERT ---
    assert!(other.layer_info(foreign).is_none());
    assert_eq!(other.layer_info(own).unwrap().state, LayerState::Attached);
    assert_eq!(
        h.proxy.layer_info(foreign).unwrap().state,
        LayerState::Created,
        "The issuing proxy keeps its layer"
    );
}

#[test]
fn test_copy_layer_into_rejects_malformed_bitmap() {
    let h = harness();
    let (producer, consumer) = BufferQueue::create("camera", 2, 2, 2);
    producer.connect().unwrap();
    let mut item = producer.dequeue_buffer().unwrap();
    item.buffer.as_mut().unwrap().fill(0xff44_4444);
    producer.queue_buffer(item).unwrap();
    let layer = h.proxy.create_texture_layer().expect("layer");
    h.proxy.attach_layer_source(layer, consumer);
    h.proxy.push_layer_update(layer);
    h.proxy.sync_and_draw_frame(&frame_info());

    let mut short = PixelBuffer {
        width: 2,
        height: 2,
        pixels: vec![0; 3],
        color_space: None,
    };
    assert!(!h.proxy.copy_layer_into(layer, &mut short));
    assert_eq!(short.pixels, vec![0; 3]);

    assert!(h.thread.is_running(), "A bad bitmap must not stop the render thread");
    let mut bitmap = PixelBuffer::new(2, 2);
    assert!(h.proxy.copy_layer_into(layer, &mut bitmap));
}

// --- LIFECYCLE ---

#[test]
fn test_pause_reports_a_canceled_frame() {
    let config = RenderThreadConfig {
        frame_rate_hz: 1,
        ..RenderThreadConfig::default()
    };
    let h = harness_with(config);

    h.proxy.notify_frame_pending();
    assert!(h.proxy.pause());
    assert!(!h.proxy.pause());
    assert_eq!(h.proxy.context_state(), ContextState::Paused);

    h.proxy.sync_and_draw_frame(&frame_info());
    assert_eq!(h.proxy.context_state(), ContextState::Active);
}

#[test]
fn test_stopped_and_detached_targets_do_not_draw() {
    let h = harness();

    h.proxy.set_stopped(true);
    assert_eq!(
        h.proxy.sync_and_draw_frame(&frame_info()),
        SyncResult::CONTEXT_STOPPED
    );
    h.proxy.set_stopped(false);
    assert!(h.proxy.sync_and_draw_frame(&frame_info()).is_empty());

    h.proxy.set_surface(None);
    assert_eq!(
        h.proxy.sync_and_draw_frame(&frame_info()),
        SyncResult::LOST_SURFACE_REWARD_IF_FOUND
    );
    assert_eq!(h.proxy.context_state(), ContextState::Uninitialized);
    assert!(!h.surface.is_connected());
}

#[test]
fn test_content_bounds_clip_the_frame() {
    let h = harness();
    h.proxy
        .add_render_node(filled("all", Rect::new(0, 0, 4, 4), 0xff00_ff00), false);
    h.proxy.set_content_draw_bounds(0, 0, 2, 2);

    h.proxy.sync_and_draw_frame(&frame_info());

    let frame = h.surface.read_back().unwrap();
    assert_eq!(frame.pixel(1, 1), Some(0xff00_ff00));
    assert_eq!(frame.pixel(3, 3), Some(0xff00_0000));
}

#[test]
fn test_profile_dump_counts_and_resets() {
    let h = harness();
    h.proxy.set_name("main-window");
    h.proxy.sync_and_draw_frame(&frame_info());

    let dump = h.proxy.dump_profile_info(DumpFlags::FRAME_STATS | DumpFlags::RESET);
    assert!(dump.contains("main-window"));
    assert!(dump.contains("Total frames rendered: 1"));
    let dump = h.proxy.dump_profile_info(DumpFlags::FRAME_STATS);
    assert!(dump.contains("Total frames rendered: 0"));
}

#[test]
fn test_draw_render_node_without_sync() {
    let h = harness();
    let node = filled("overlay", Rect::new(0, 0, 4, 4), 0xff12_3456);

    let result = h.proxy.draw_render_node(node);

    assert!(result.is_empty());
    assert_eq!(h.surface.read_back().unwrap().pixel(2, 2), Some(0xff12_3456));
    assert_eq!(h.proxy.scene_stats().back_nodes, 0, "The scene is untouched");
}

#[test]
fn test_thread_identity_and_properties() {
    let h = harness();
    assert_eq!(h.proxy.render_thread_id(), h.thread.thread_id());
    assert!(!h.proxy.load_system_properties());
    h.thread
        .override_property(hwr_core::properties::RenderProperties::PROFILE_KEY, "true");
    assert!(h.proxy.load_system_properties());
}

#[test]
fn test_dropping_a_proxy_releases_its_surface() {
    let h = harness();
    let surface = h.surface.clone();
    h.proxy.fence();
    assert!(surface.is_connected());

    drop(h.proxy);

    assert!(!surface.is_connected());
}
