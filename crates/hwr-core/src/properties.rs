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

//! Process-wide tunables and the stores they are read from.

use std::path::Path;

/// A key/value override table shared by the whole process.
pub trait PropertiesStore: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Overrides a value.
    fn set_override(&self, key: &str, value: &str);
}

/// An on-disk cache location for compiled shaders.
pub trait ShaderCache: Send + Sync {
    /// Sets the backing file. Pure configuration.
    fn set_path(&self, path: &Path);
}

/// The typed view of the renderer's tunables.
///
/// The first group is read from the [`PropertiesStore`]; the second group is
/// set directly by the process through the render thread.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderProperties {
    /// Collect per-frame timing for profile dumps.
    pub profiling: bool,
    /// Visualize overdraw.
    pub debug_overdraw: bool,
    /// Flash redrawn regions.
    pub show_dirty_regions: bool,

    /// Render text with maximum contrast.
    pub high_contrast_text: bool,
    /// Allow the render thread to run animations on its own.
    pub render_thread_animations: bool,
    /// Enable debug layers.
    pub debugging_enabled: bool,
    /// The process is isolated and has no access to shared caches.
    pub isolated_process: bool,
    /// Priority hint for the graphics context.
    pub context_priority: i32,
}

impl RenderProperties {
    /// Enables frame profiling.
    pub const PROFILE_KEY: &'static str = "debug.hwui.profile";
    /// Enables the overdraw visualization.
    pub const OVERDRAW_KEY: &'static str = "debug.hwui.overdraw";
    /// Enables dirty region flashing.
    pub const DIRTY_REGIONS_KEY: &'static str = "debug.hwui.show_dirty_regions";

    /// Re-reads the store-backed values. Returns `true` if any changed.
    pub fn load(&mut self, store: &dyn PropertiesStore) -> bool {
        let before = (self.profiling, self.debug_overdraw, self.show_dirty_regions);
        self.profiling = read_bool(store, Self::PROFILE_KEY);
        self.debug_overdraw = read_bool(store, Self::OVERDRAW_KEY);
        self.show_dirty_regions = read_bool(store, Self::DIRTY_REGIONS_KEY);
        let changed = before != (self.profiling, self.debug_overdraw, self.show_dirty_regions);
        if changed {
            log::info!("Render properties changed: {self:?}");
        }
        changed
    }
}

fn read_bool(store: &dyn PropertiesStore, key: &str) -> bool {
    match store.get(key).as_deref() {
        Some("true") | Some("1") | Some("visual_bars") | Some("show") => true,
        Some("false") | Some("0") | Some("") | None => false,
        Some(other) => {
            log::warn!("Unrecognized value '{other}' for property '{key}', treating as false");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore(Mutex<HashMap<String, String>>);

    impl PropertiesStore for MapStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.lock().unwrap().get(key).cloned()
        }

        fn set_override(&self, key: &str, value: &str) {
            self.0
                .lock()
                .unwrap()
                .insert(key.to_owned(), value.to_owned());
        }
    }

    #[test]
    fn load_reports_changes_only() {
        let store = MapStore::default();
        let mut props = RenderProperties::default();
        assert!(!props.load(&store));

        store.set_override(RenderProperties::PROFILE_KEY, "true");
        assert!(props.load(&store));
        assert!(props.profiling);
        assert!(!props.load(&store));
    }

    #[test]
    fn unknown_value_reads_as_false() {
        let store = MapStore::default();
        store.set_override(RenderProperties::OVERDRAW_KEY, "maybe");
        let mut props = RenderProperties::default();
        assert!(!props.load(&store));
        assert!(!props.debug_overdraw);
    }
}
