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

//! Deferred texture layers.
//!
//! A layer's pixels come from an external producer through a
//! [`BufferConsumer`]. The caller only pushes "an update is available"; the
//! render thread acquires the buffer during the next sync.
//!
//! ```text
//! Created --attach--> Attached --detach--> Detached
//!    \                   |                    |
//!     +------cancel------+-------cancel-------+--> Canceled (terminal)
//! ```

use std::fmt;
use std::sync::Arc;

use hwr_core::surface::{BufferConsumer, PixelBuffer};
use hwr_core::{BufferError, Handle, HandleArena};

/// Lifecycle state of a [`DeferredLayerUpdater`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    /// No buffer source yet.
    Created,
    /// Bound to a buffer source; updates are accepted.
    Attached,
    /// The buffer source was severed; the layer keeps its last texture.
    Detached,
    /// Updates were canceled. Nothing is applied anymore.
    Canceled,
}

/// A diagnostic view of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerInfo {
    /// Current state.
    pub state: LayerState,
    /// An update waits for the next sync.
    pub update_pending: bool,
    /// Number of updates applied so far.
    pub updates_applied: u64,
    /// Size of the current texture, if any.
    pub texture_size: Option<(u32, u32)>,
}

/// A texture layer whose content arrives asynchronously.
pub struct DeferredLayerUpdater {
    state: LayerState,
    source: Option<Arc<dyn BufferConsumer>>,
    update_pending: bool,
    texture: Option<PixelBuffer>,
    updates_applied: u64,
}

impl DeferredLayerUpdater {
    /// Creates a layer with no source.
    pub fn new() -> Self {
        Self {
            state: LayerState::Created,
            source: None,
            update_pending: false,
            texture: None,
            updates_applied: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> LayerState {
        self.state
    }

    /// Binds the buffer source. Rejected once canceled.
    pub fn attach_source(&mut self, source: Arc<dyn BufferConsumer>) -> bool {
        if self.state == LayerState::Canceled {
            log::warn!("Cannot attach a buffer source to a canceled layer");
            return false;
        }
        self.source = Some(source);
        self.state = LayerState::Attached;
        true
    }

    /// Marks an update as available. Only an attached layer accepts it.
    pub fn push_update(&mut self) -> bool {
        if self.state != LayerState::Attached {
            log::debug!("Ignoring layer update in state {:?}", self.state);
            return false;
        }
        self.update_pending = true;
        true
    }

    /// Cancels pending and future updates.
    pub fn cancel(&mut self) {
        self.update_pending = false;
        self.state = LayerState::Canceled;
    }

    /// Severs the link to the buffer source and keeps the layer.
    pub fn detach(&mut self) {
        self.source = None;
        self.update_pending = false;
        if self.state != LayerState::Canceled {
            self.state = LayerState::Detached;
        }
    }

    /// Applies the pending update, if any. Returns whether a new texture was
    /// taken.
    pub fn apply(&mut self) -> Result<bool, BufferError> {
        if !self.update_pending || self.state != LayerState::Attached {
            return Ok(false);
        }
        self.update_pending = false;
        let Some(source) = self.source.as_ref() else {
            return Ok(false);
        };

        let item = source.acquire_buffer()?;
        let texture = item.buffer.clone();
        if let Err(e) = source.release_buffer(item) {
            log::debug!("Layer buffer release failed: {e}");
        }
        match texture {
            Some(texture) => {
                self.texture = Some(texture);
                self.updates_applied += 1;
                Ok(true)
            }
            None => {
                log::warn!("Layer update carried no buffer");
                Ok(false)
            }
        }
    }

    /// Copies the current texture into `bitmap`. Fails without a texture, on
    /// a size mismatch or when either buffer's pixels disagree with its size.
    pub fn copy_into(&self, bitmap: &mut PixelBuffer) -> bool {
        if !bitmap.is_consistent() {
            log::warn!(
                "Layer copy target {}x{} holds {} pixels",
                bitmap.width,
                bitmap.height,
                bitmap.pixels.len()
            );
            return false;
        }
        match &self.texture {
            Some(texture) if !texture.is_consistent() => {
                log::warn!("Layer texture {}x{} is malformed", texture.width, texture.height);
                false
            }
            Some(texture) if texture.width == bitmap.width && texture.height == bitmap.height => {
                bitmap.pixels.copy_from_slice(&texture.pixels);
                bitmap.color_space = texture.color_space;
                true
            }
            Some(texture) => {
                log::warn!(
                    "Layer copy size mismatch: texture {}x{}, bitmap {}x{}",
                    texture.width,
                    texture.height,
                    bitmap.width,
                    bitmap.height
                );
                false
            }
            None => false,
        }
    }

    /// Drops the current texture.
    pub fn clear_texture(&mut self) {
        self.texture = None;
    }

    /// A diagnostic view.
    pub fn info(&self) -> LayerInfo {
        LayerInfo {
            state: self.state,
            update_pending: self.update_pending,
            updates_applied: self.updates_applied,
            texture_size: self.texture.as_ref().map(|t| (t.width, t.height)),
        }
    }
}

impl Default for DeferredLayerUpdater {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeferredLayerUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredLayerUpdater")
            .field("info", &self.info())
            .finish()
    }
}

/// Handle of a layer inside a [`LayerRegistry`].
pub type LayerId = Handle<DeferredLayerUpdater>;

/// The deferred layers of one render context, owned by the render thread.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: HandleArena<DeferredLayerUpdater>,
    pending: Vec<LayerId>,
}

impl LayerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a layer.
    pub fn create(&mut self) -> LayerId {
        self.layers.insert(DeferredLayerUpdater::new())
    }

    /// Binds a layer to its buffer source.
    pub fn attach_source(&mut self, id: LayerId, source: Arc<dyn BufferConsumer>) -> bool {
        match self.layers.get_mut(id) {
            Some(layer) => layer.attach_source(source),
            None => {
                log::warn!("attach_source on unknown layer {id:?}");
                false
            }
        }
    }

    /// Queues an update for the next sync.
    pub fn push_update(&mut self, id: LayerId) -> bool {
        let Some(layer) = self.layers.get_mut(id) else {
            log::warn!("push_update on unknown layer {id:?}");
            return false;
        };
        if !layer.push_update() {
            return false;
        }
        if !self.pending.contains(&id) {
            self.pending.push(id);
        }
        true
    }

    /// Cancels a layer's updates, including one already queued.
    pub fn cancel_update(&mut self, id: LayerId) {
        if let Some(layer) = self.layers.get_mut(id) {
            layer.cancel();
        }
        self.pending.retain(|p| *p != id);
    }

    /// Severs a layer from its buffer source.
    pub fn detach(&mut self, id: LayerId) {
        if let Some(layer) = self.layers.get_mut(id) {
            layer.detach();
        }
        self.pending.retain(|p| *p != id);
    }

    /// Destroys a layer. Its handle becomes invalid.
    pub fn destroy(&mut self, id: LayerId) -> bool {
        self.pending.retain(|p| *p != id);
        self.layers.remove(id).is_some()
    }

    /// Applies every queued update in push order. Returns the number of
    /// textures taken.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        for id in std::mem::take(&mut self.pending) {
            let Some(layer) = self.layers.get_mut(id) else {
                continue;
            };
            match layer.apply() {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => log::warn!("Failed to apply update of layer {id:?}: {e}"),
            }
        }
        applied
    }

    /// Copies a layer's texture into `bitmap`.
    pub fn copy_into(&self, id: LayerId, bitmap: &mut PixelBuffer) -> bool {
        self.layers
            .get(id)
            .is_some_and(|layer| layer.copy_into(bitmap))
    }

    /// Drops every texture; layers stay alive.
    pub fn clear_textures(&mut self) {
        for (_, layer) in self.layers.iter_mut() {
            layer.clear_texture();
        }
    }

    /// A diagnostic view of one layer.
    pub fn info(&self, id: LayerId) -> Option<LayerInfo> {
        self.layers.get(id).map(DeferredLayerUpdater::info)
    }

    /// Number of live layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether no layer is alive.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Destroys every layer.
    pub fn clear(&mut self) {
        self.pending.clear();
        let dropped = self.layers.drain().len();
        if dropped > 0 {
            log::debug!("Destroyed {dropped} layers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwr_core::surface::BufferItem;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubConsumer {
        queued: Mutex<Vec<PixelBuffer>>,
        released: Mutex<u32>,
    }

    impl StubConsumer {
        fn produce(&self, color: u32) {
            let mut buffer = PixelBuffer::new(2, 2);
            buffer.fill(color);
            self.queued.lock().unwrap().push(buffer);
        }
    }

    impl BufferConsumer for StubConsumer {
        fn acquire_buffer(&self) -> Result<BufferItem, BufferError> {
            let mut queued = self.queued.lock().unwrap();
            if queued.is_empty() {
                return Err(BufferError::NoBufferAvailable);
            }
            Ok(BufferItem {
                slot: 0,
                frame_number: 1,
                buffer: Some(queued.remove(0)),
            })
        }

        fn release_buffer(&self, _item: BufferItem) -> Result<(), BufferError> {
            *self.released.lock().unwrap() += 1;
            Ok(())
        }

        fn max_buffer_count(&self) -> usize {
            2
        }
    }

    fn attached() -> (LayerRegistry, LayerId, Arc<StubConsumer>) {
        let mut registry = LayerRegistry::new();
        let id = registry.create();
        let consumer = Arc::new(StubConsumer::default());
        assert!(registry.attach_source(id, consumer.clone()));
        (registry, id, consumer)
    }

    #[test]
    fn pushed_update_is_applied_and_buffer_released() {
        let (mut registry, id, consumer) = attached();
        consumer.produce(0xff00_ff00);
        assert!(registry.push_update(id));
        assert_eq!(registry.apply_pending(), 1);
        assert_eq!(*consumer.released.lock().unwrap(), 1);

        let mut bitmap = PixelBuffer::new(2, 2);
        assert!(registry.copy_into(id, &mut bitmap));
        assert_eq!(bitmap.pixel(0, 0), Some(0xff00_ff00));
    }

    #[test]
    fn push_before_attach_is_ignored() {
        let mut registry = LayerRegistry::new();
        let id = registry.create();
        assert!(!registry.push_update(id));
        assert_eq!(registry.info(id).unwrap().state, LayerState::Created);
    }

    #[test]
    fn cancel_wins_over_a_queued_push() {
        let (mut registry, id, consumer) = attached();
        consumer.produce(1);
        assert!(registry.push_update(id));
        registry.cancel_update(id);
        assert!(!registry.push_update(id));
        assert_eq!(registry.apply_pending(), 0);

        let info = registry.info(id).unwrap();
        assert_eq!(info.state, LayerState::Canceled);
        assert_eq!(info.updates_applied, 0);
    }

    #[test]
    fn detached_layer_keeps_texture_and_rejects_pushes() {
        let (mut registry, id, consumer) = attached();
        consumer.produce(7);
        registry.push_update(id);
        registry.apply_pending();

        registry.detach(id);
        assert!(!registry.push_update(id));
        let info = registry.info(id).unwrap();
        assert_eq!(info.state, LayerState::Detached);
        assert_eq!(info.texture_size, Some((2, 2)));
    }

    #[test]
    fn copy_into_rejects_size_mismatch_and_missing_texture() {
        let (mut registry, id, consumer) = attached();
        let mut bitmap = PixelBuffer::new(2, 2);
        assert!(!registry.copy_into(id, &mut bitmap));

        consumer.produce(3);
        registry.push_update(id);
        registry.apply_pending();
        let mut wrong = PixelBuffer::new(3, 3);
        assert!(!registry.copy_into(id, &mut wrong));
    }

    #[test]
    fn copy_into_rejects_a_bitmap_shorter_than_its_size() {
        let (mut registry, id, consumer) = attached();
        consumer.produce(5);
        registry.push_update(id);
        registry.apply_pending();

        let mut short = PixelBuffer {
            width: 2,
            height: 2,
            pixels: vec![0; 3],
            color_space: None,
        };
        assert!(!registry.copy_into(id, &mut short));
        assert_eq!(short.pixels, vec![0; 3]);
    }

    #[test]
    fn handle_from_another_registry_is_unknown() {
        let mut first = LayerRegistry::new();
        let (mut second, own, _consumer) = attached();
        let foreign = first.create();

        second.cancel_update(foreign);
        second.detach(foreign);
        assert!(!second.destroy(foreign));
        assert!(second.info(foreign).is_none());
        assert_eq!(second.info(own).unwrap().state, LayerState::Attached);
    }

    #[test]
    fn acquire_failure_is_logged_not_fatal() {
        let (mut registry, id, _consumer) = attached();
        registry.push_update(id);
        assert_eq!(registry.apply_pending(), 0);
        assert!(!registry.info(id).unwrap().update_pending);
    }

    #[test]
    fn destroyed_handle_is_invalid() {
        let (mut registry, id, _consumer) = attached();
        assert!(registry.destroy(id));
        assert!(registry.info(id).is_none());
        assert!(!registry.push_update(id));
        assert!(!registry.destroy(id));
    }
}
