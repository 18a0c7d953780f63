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

// Threaded renderer sandbox
// Draws a small animated scene, captures it and prints the statistics.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use hwr_sdk::prelude::*;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;

fn load_config() -> Result<RenderThreadConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            RenderThreadConfig::from_json_str(&json)
                .with_context(|| format!("Invalid config file {path}"))
        }
        None => Ok(RenderThreadConfig::default()),
    }
}

fn panel(name: &str, rect: Rect, color: u32) -> Arc<RecordedNode> {
    let mut list = DisplayList::new();
    list.push(DrawOp::FillRect { rect, color });
    RecordedNode::with_display_list(name, list)
}

fn main() -> Result<()> {
    hwr_sdk::init_logging();

    let thread = software_render_thread(load_config()?)?;
    let root = RootScene::new("sandbox", Box::new(LogErrorReporter::new()));
    let proxy = RenderProxy::new(thread.clone(), false, root)?;
    let (surface, _consumer) = BufferQueue::create("sandbox-window", WIDTH, HEIGHT, 3);
    let surface: Arc<dyn PresentationSurface> = surface;
    proxy.set_name("sandbox");
    proxy.set_surface(Some(surface.clone()));
    proxy.set_frame_complete_callback(Some(Arc::new(|frame: u64| {
        log::info!("First frame complete: #{frame}");
    })));

    let background = panel("background", Rect::from_size(WIDTH, HEIGHT), 0xff20_2020);
    let spinner = panel("spinner", Rect::new(8, 8, 24, 24), 0xffe0_4040);
    spinner.animate_for_frames(3);
    let spinner: Arc<dyn RenderNode> = spinner;
    proxy.add_render_node(background, true);
    proxy.add_render_node(spinner.clone(), false);
    proxy.root().attach_animating_node(&spinner);

    for frame in 1.. {
        let now = now_nanos();
        let info = UiFrameInfoBuilder::new().set_vsync(now, now).build();
        let result = proxy.sync_and_draw_frame(&info);
        log::info!("Frame {frame}: {result:?}");
        if !result.contains(SyncResult::REDRAW_REQUIRED) {
            break;
        }
    }

    let bitmap = create_hardware_bitmap(&thread, spinner, 16, 16)?;
    log::info!(
        "Captured spinner: {}x{}, pixel (8, 8) {:#010x}",
        bitmap.width,
        bitmap.height,
        bitmap.pixel(8, 8).unwrap_or_default()
    );

    let mut thumbnail = PixelBuffer::new(WIDTH / 4, HEIGHT / 4);
    let copied = copy_surface_into(&thread, &surface, None, &mut thumbnail);
    log::info!("Thumbnail copy: {copied:?}");

    println!("{}", proxy.dump_profile_info(DumpFlags::FRAME_STATS | DumpFlags::JSON));
    println!("{}", thread.process_stats());

    proxy.destroy();
    thread.stop();
    Ok(())
}
