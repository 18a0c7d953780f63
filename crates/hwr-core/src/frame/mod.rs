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

//! Per-frame records exchanged between the caller and the render thread.
//!
//! - [`FrameInfo`]: the fixed-size timing record, filled partly by the caller
//!   and partly by the render thread.
//! - [`SyncResult`]: the bit flags returned by a sync-and-draw.

mod info;
mod result;

pub use self::info::{
    FrameInfo, FrameInfoFlags, FrameInfoIndex, UiFrameInfoBuilder, UI_THREAD_FRAME_INFO_SIZE,
};
pub use self::result::{DrawOutcome, SyncResult};
