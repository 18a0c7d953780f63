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

//! Scene-graph contracts and the immutable snapshot handed to the backend.
//!
//! How a node builds its drawing commands is up to the node. The render thread
//! only asks it to [`record`](RenderNode::record) during the sync phase and to
//! [`animate`](RenderNode::animate) while it sits in the animating set. The
//! resulting [`SceneSnapshot`] is what the draw phase consumes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::math::{Rect, Vec3};

/// A process-unique identifier of a render node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Allocates a fresh identifier.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Whether an animation still needs ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    /// More frames are needed.
    Running,
    /// The animation reached its end.
    Finished,
}

/// A node of the caller's scene graph.
///
/// Nodes are shared between the caller, which owns them, and the render
/// thread, which only ever holds them during a sync or through a weak
/// reference in the animating set.
pub trait RenderNode: Send + Sync {
    /// The identifier of this node.
    fn id(&self) -> NodeId;

    /// A debug name.
    fn name(&self) -> &str;

    /// Produces the drawing commands of this node.
    ///
    /// An error is routed to the root scene's error reporter and the node is
    /// skipped for this frame.
    fn record(&self) -> Result<DisplayList, String>;

    /// Advances the node's animation to `frame_time_nanos`.
    fn animate(&self, frame_time_nanos: i64) -> AnimationState {
        let _ = frame_time_nanos;
        AnimationState::Finished
    }
}

/// A driver for animated vector properties, ticked once per sync.
pub trait PropertyAnimator: Send + Sync {
    /// Advances the driver to `frame_time_nanos`.
    fn advance(&self, frame_time_nanos: i64) -> AnimationState;
}

/// A single drawing command. Colors are packed ARGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawOp {
    /// Fills the whole target.
    Clear(u32),
    /// Fills a rectangle.
    FillRect {
        /// The area to fill.
        rect: Rect,
        /// The fill color.
        color: u32,
    },
}

/// An ordered list of drawing commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayList {
    /// The commands, in paint order.
    pub ops: Vec<DrawOp>,
}

impl DisplayList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command.
    pub fn push(&mut self, op: DrawOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Returns `true` if nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// The recorded state of one node, frozen for the draw phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
    /// The node's identifier.
    pub id: NodeId,
    /// The node's debug name.
    pub name: String,
    /// What the node recorded during the sync phase.
    pub display_list: DisplayList,
}

/// Where a top-level node goes in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Drawn before every back node. The latest front addition is drawn first.
    Front,
    /// Drawn after every front node, in insertion order.
    Back,
}

/// How the surface treats its previous content on swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SwapBehavior {
    /// The previous buffer content is preserved.
    #[default]
    Preserve,
    /// The previous buffer content may be discarded.
    DiscardBuffer,
}

/// Position and size of the shadow light source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LightGeometry {
    /// The light center, in surface coordinates.
    pub center: Vec3,
    /// The light radius.
    pub radius: f32,
}

/// Per-context settings carried into every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSettings {
    /// Ambient shadow alpha, `255 * alpha`.
    pub ambient_light_alpha: u8,
    /// Spot shadow alpha, `255 * alpha`.
    pub spot_light_alpha: u8,
    /// Shadow light source.
    pub light_geometry: LightGeometry,
    /// The content fully covers the surface.
    pub opaque: bool,
    /// Render in a wide color gamut.
    pub wide_gamut: bool,
    /// Apply automatic dark theming.
    pub force_dark: bool,
    /// Swap behavior of the bound surface.
    pub swap_behavior: SwapBehavior,
    /// The content area; drawing is clipped to it when set.
    pub content_bounds: Option<Rect>,
    /// Render text with maximum contrast.
    pub high_contrast_text: bool,
    /// The context was created translucent.
    pub translucent: bool,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            ambient_light_alpha: 0,
            spot_light_alpha: 0,
            light_geometry: LightGeometry::default(),
            opaque: false,
            wide_gamut: false,
            force_dark: false,
            swap_behavior: SwapBehavior::default(),
            content_bounds: None,
            high_contrast_text: false,
            translucent: false,
        }
    }
}

/// Everything the draw phase may look at.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    /// Monotonic frame counter of the context.
    pub frame_number: u64,
    /// The vsync this frame was produced for.
    pub vsync_nanos: i64,
    /// Settings committed with this frame.
    pub settings: FrameSettings,
    /// Top-level nodes in draw order.
    pub nodes: Vec<NodeSnapshot>,
}

/// Lifecycle of a per-proxy render context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created without a usable surface.
    Uninitialized,
    /// Drawing normally.
    Active,
    /// Temporarily paused; the next sync resumes.
    Paused,
    /// Drawing suppressed until restarted.
    Stopped,
    /// Torn down. Terminal.
    Destroyed,
}

/// A summary of the committed root scene, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneStats {
    /// Nodes in the front list.
    pub front_nodes: usize,
    /// Nodes in the back list.
    pub back_nodes: usize,
    /// Entries in the animating set.
    pub animating_nodes: usize,
    /// Registered property-animation drivers.
    pub property_animators: usize,
    /// Scene operations queued by the caller and not yet committed.
    pub pending_ops: usize,
}
