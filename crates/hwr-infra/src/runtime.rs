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

//! A caller runtime for callers without a managed environment.

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use hwr_core::runtime::CallerRuntime;
use hwr_core::AttachError;

/// Tracks which threads are attached. Attaching twice is an error.
#[derive(Debug, Default)]
pub struct NativeCallerRuntime {
    attached: Mutex<HashMap<ThreadId, String>>,
}

impl NativeCallerRuntime {
    /// Creates a runtime with no attached thread.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the attached threads.
    pub fn attached_threads(&self) -> Vec<String> {
        self.attached.lock().unwrap().values().cloned().collect()
    }
}

impl CallerRuntime for NativeCallerRuntime {
    fn attach_current_thread(&self, thread_name: &str) -> Result<(), AttachError> {
        let mut attached = self.attached.lock().unwrap();
        let id = thread::current().id();
        if attached.contains_key(&id) {
            return Err(AttachError {
                thread_name: thread_name.to_owned(),
                reason: "thread is already attached".to_owned(),
            });
        }
        attached.insert(id, thread_name.to_owned());
        log::debug!("Attached thread '{thread_name}' to the caller runtime");
        Ok(())
    }

    fn detach_current_thread(&self) {
        if let Some(name) = self.attached.lock().unwrap().remove(&thread::current().id()) {
            log::debug!("Detached thread '{name}' from the caller runtime");
        }
    }
}
