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

use std::sync::{Arc, Weak};

use hwr_core::scene::{
    AnimationState, NodeId, Placement, PropertyAnimator, RenderNode, SceneStats,
};

use super::SceneOp;

/// What a tick left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickSummary {
    /// Animating nodes still running.
    pub running_nodes: usize,
    /// Animating nodes removed by this tick (finished or dropped).
    pub finished_nodes: usize,
    /// Property-animation drivers still running.
    pub running_animators: usize,
}

impl TickSummary {
    /// Whether another frame is needed.
    pub fn needs_redraw(&self) -> bool {
        self.running_nodes > 0 || self.running_animators > 0
    }
}

/// The committed root scene, owned by the render thread.
///
/// Every sequence is kept in insertion order so that a tick over the same
/// committed inputs visits nodes in the same order.
#[derive(Default)]
pub struct RootSceneState {
    front: Vec<Arc<dyn RenderNode>>,
    back: Vec<Arc<dyn RenderNode>>,
    animating: Vec<(NodeId, Weak<dyn RenderNode>)>,
    animators: Vec<Arc<dyn PropertyAnimator>>,
}

impl RootSceneState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies queued mutations in submission order.
    pub fn apply(&mut self, ops: Vec<SceneOp>) {
        for op in ops {
            match op {
                SceneOp::AddNode { node, placement } => {
                    let id = node.id();
                    self.remove_top_level(id);
                    match placement {
                        Placement::Front => self.front.push(node),
                        Placement::Back => self.back.push(node),
                    }
                }
                SceneOp::RemoveNode(id) => {
                    if !self.remove_top_level(id) {
                        log::debug!("Node {id:?} is not a top-level node");
                    }
                }
                SceneOp::AttachAnimating { id, node } => {
                    if !self.is_animating(id) {
                        self.animating.push((id, node));
                    }
                }
                SceneOp::DetachAnimating(id) => {
                    self.animating.retain(|(n, _)| *n != id);
                }
                SceneOp::AddAnimator(animator) => {
                    let ptr = Arc::as_ptr(&animator) as *const ();
                    if !self
                        .animators
                        .iter()
                        .any(|a| Arc::as_ptr(a) as *const () == ptr)
                    {
                        self.animators.push(animator);
                    }
                }
            }
        }
    }

    /// Advances every animating node and driver to `frame_time_nanos`,
    /// dropping those that finished or whose node no longer exists.
    pub fn tick(&mut self, frame_time_nanos: i64) -> TickSummary {
        let before = self.animating.len();
        self.animating.retain(|(id, weak)| match weak.upgrade() {
            Some(node) => node.animate(frame_time_nanos) == AnimationState::Running,
            None => {
                log::trace!("Animating node {id:?} was dropped by its owner");
                false
            }
        });
        self.animators
            .retain(|a| a.advance(frame_time_nanos) == AnimationState::Running);

        TickSummary {
            running_nodes: self.animating.len(),
            finished_nodes: before - self.animating.len(),
            running_animators: self.animators.len(),
        }
    }

    /// Top-level nodes in draw order: front nodes, most recent first, then
    /// back nodes in insertion order.
    pub fn draw_order(&self) -> impl Iterator<Item = &Arc<dyn RenderNode>> {
        self.front.iter().rev().chain(self.back.iter())
    }

    /// Whether `id` is in the animating set.
    pub fn is_animating(&self, id: NodeId) -> bool {
        self.animating.iter().any(|(n, _)| *n == id)
    }

    /// Counts for diagnostics. `pending_ops` comes from the caller-side queue.
    pub fn stats(&self, pending_ops: usize) -> SceneStats {
        SceneStats {
            front_nodes: self.front.len(),
            back_nodes: self.back.len(),
            animating_nodes: self.animating.len(),
            property_animators: self.animators.len(),
            pending_ops,
        }
    }

    /// Drops every reference held.
    pub fn clear(&mut self) {
        self.front.clear();
        self.back.clear();
        self.animating.clear();
        self.animators.clear();
    }

    fn remove_top_level(&mut self, id: NodeId) -> bool {
        let before = self.front.len() + self.back.len();
        self.front.retain(|n| n.id() != id);
        self.back.retain(|n| n.id() != id);
        before != self.front.len() + self.back.len()
    }
}
