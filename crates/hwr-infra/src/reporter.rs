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

//! Error reporting that ends in the log.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use hwr_core::ErrorReporter;

/// Logs every reported error and keeps the most recent one.
#[derive(Debug, Default)]
pub struct LogErrorReporter {
    count: AtomicUsize,
    last: Mutex<Option<String>>,
}

impl LogErrorReporter {
    /// Creates a reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of errors reported so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// The most recent error.
    pub fn last_error(&self) -> Option<String> {
        self.last.lock().unwrap().clone()
    }
}

impl ErrorReporter for LogErrorReporter {
    fn on_error(&self, message: &str) {
        log::error!("Render error: {message}");
        self.count.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(message.to_owned());
    }
}
