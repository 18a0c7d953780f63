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

//! # HWR Data
//!
//! State that crosses the caller/render-thread boundary:
//!
//! - [`scene::RootScene`]: the caller-visible root of a scene graph. The caller
//!   queues mutations on it; the render thread drains them during the sync
//!   phase into its own [`scene::RootSceneState`].
//! - [`layer::LayerRegistry`]: deferred texture layers fed by external buffer
//!   producers, owned by the render thread.

#![warn(missing_docs)]

pub mod layer;
pub mod scene;

pub use layer::{DeferredLayerUpdater, LayerId, LayerInfo, LayerRegistry, LayerState};
pub use scene::{RecordedNode, RootScene, RootSceneState, SceneOp, TickSummary};
