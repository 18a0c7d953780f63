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

//! Holder for the on-disk location of a shader cache.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hwr_core::properties::ShaderCache;

/// A shader cache backed by a file on disk.
///
/// Only the path is configured here; the backend reads and writes the file.
#[derive(Debug)]
pub struct DiskShaderCache {
    label: &'static str,
    path: Mutex<Option<PathBuf>>,
}

impl DiskShaderCache {
    /// Creates a cache with no backing file yet.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            path: Mutex::new(None),
        }
    }

    /// The configured backing file.
    pub fn path(&self) -> Option<PathBuf> {
        self.path.lock().unwrap().clone()
    }
}

impl ShaderCache for DiskShaderCache {
    fn set_path(&self, path: &Path) {
        log::info!("{} cache file set to {}", self.label, path.display());
        *self.path.lock().unwrap() = Some(path.to_path_buf());
    }
}
