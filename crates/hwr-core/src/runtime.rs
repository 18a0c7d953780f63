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

//! The caller runtime the render thread attaches to.

use crate::error::AttachError;

/// The environment listeners run in.
///
/// Before running any task, the render thread registers itself with this
/// runtime exactly once, so that listener dispatches made from it are valid.
pub trait CallerRuntime: Send + Sync {
    /// Registers the current thread under `thread_name`.
    fn attach_current_thread(&self, thread_name: &str) -> Result<(), AttachError>;

    /// Unregisters the current thread. Called when the render thread exits.
    fn detach_current_thread(&self) {}
}
