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

//! The root of a scene graph and its render-thread committed state.

mod node;
mod state;

pub use self::node::RecordedNode;
pub use self::state::{RootSceneState, TickSummary};

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use hwr_core::scene::{NodeId, Placement, PropertyAnimator, RenderNode};
use hwr_core::ErrorReporter;

/// A scene mutation queued by the caller, applied at the next sync.
pub enum SceneOp {
    /// Adds a top-level node.
    AddNode {
        /// The node.
        node: Arc<dyn RenderNode>,
        /// Front or back of traversal order.
        placement: Placement,
    },
    /// Removes a top-level node.
    RemoveNode(NodeId),
    /// Registers a node for per-frame animation ticking.
    AttachAnimating {
        /// The node's identifier.
        id: NodeId,
        /// The node. The caller keeps ownership.
        node: Weak<dyn RenderNode>,
    },
    /// Unregisters an animating node.
    DetachAnimating(NodeId),
    /// Registers a property-animation driver.
    AddAnimator(Arc<dyn PropertyAnimator>),
}

impl fmt::Debug for SceneOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneOp::AddNode { node, placement } => f
                .debug_struct("AddNode")
                .field("id", &node.id())
                .field("placement", placement)
                .finish(),
            SceneOp::RemoveNode(id) => f.debug_tuple("RemoveNode").field(id).finish(),
            SceneOp::AttachAnimating { id, .. } => {
                f.debug_tuple("AttachAnimating").field(id).finish()
            }
            SceneOp::DetachAnimating(id) => f.debug_tuple("DetachAnimating").field(id).finish(),
            SceneOp::AddAnimator(_) => f.write_str("AddAnimator"),
        }
    }
}

/// The caller-side root of a scene graph.
///
/// The caller never touches the render thread's committed state. Mutations
/// are queued here and drained by the render thread at the start of each
/// sync, while the caller is blocked on that sync.
pub struct RootScene {
    name: String,
    pending: Mutex<Vec<SceneOp>>,
    error_reporter: Box<dyn ErrorReporter>,
    destroyed: AtomicBool,
}

impl RootScene {
    /// Creates a root scene reporting node errors to `error_reporter`.
    pub fn new(name: impl Into<String>, error_reporter: Box<dyn ErrorReporter>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            pending: Mutex::new(Vec::new()),
            error_reporter,
            destroyed: AtomicBool::new(false),
        })
    }

    /// The debug name of the scene.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues a top-level node addition.
    pub fn add_node(&self, node: Arc<dyn RenderNode>, placement: Placement) {
        self.enqueue(SceneOp::AddNode { node, placement });
    }

    /// Queues a top-level node removal.
    pub fn remove_node(&self, id: NodeId) {
        self.enqueue(SceneOp::RemoveNode(id));
    }

    /// Queues a node for per-frame animation ticking. Only a weak reference is
    /// kept; a node dropped by the caller leaves the set on the next tick.
    pub fn attach_animating_node(&self, node: &Arc<dyn RenderNode>) {
        self.enqueue(SceneOp::AttachAnimating {
            id: node.id(),
            node: Arc::downgrade(node),
        });
    }

    /// Queues removal from the animating set. Removing an absent node is a
    /// no-op.
    pub fn detach_animating_node(&self, id: NodeId) {
        self.enqueue(SceneOp::DetachAnimating(id));
    }

    /// Queues a property-animation driver.
    pub fn add_property_animator(&self, animator: Arc<dyn PropertyAnimator>) {
        self.enqueue(SceneOp::AddAnimator(animator));
    }

    /// Number of mutations waiting for the next sync.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Takes every queued mutation, in submission order.
    pub fn take_pending(&self) -> Vec<SceneOp> {
        mem::take(&mut *self.pending.lock().unwrap())
    }

    /// Forwards an error raised on the render thread to the caller side.
    pub fn report_error(&self, message: &str) {
        log::error!("[{}] {message}", self.name);
        self.error_reporter.on_error(message);
    }

    /// Marks the scene destroyed and drops queued mutations.
    pub fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            let dropped = self.take_pending().len();
            log::debug!("Root scene '{}' destroyed ({dropped} pending ops dropped)", self.name);
        }
    }

    /// Whether [`destroy`](Self::destroy) was called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    fn enqueue(&self, op: SceneOp) {
        if self.is_destroyed() {
            log::warn!("Ignoring {op:?} on destroyed root scene '{}'", self.name);
            return;
        }
        self.pending.lock().unwrap().push(op);
    }
}

impl fmt::Debug for RootScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootScene")
            .field("name", &self.name)
            .field("pending", &self.pending_len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
