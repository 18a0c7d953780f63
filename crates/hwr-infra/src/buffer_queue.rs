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

//! An in-process buffer queue.
//!
//! The producer side ([`QueueSurface`]) dequeues a free slot, fills it and
//! queues it. The consumer side ([`QueueConsumer`]) acquires the newest
//! queued buffer and releases it when done. A buffer queued while an older
//! one is still waiting replaces it, so a producer never starves on a slow
//! consumer as long as the queue holds at least two slots.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use hwr_core::surface::{BufferConsumer, BufferItem, PixelBuffer, PresentationSurface};
use hwr_core::BufferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    Dequeued,
    Queued,
    Acquired,
}

#[derive(Debug)]
struct Slot {
    state: SlotState,
    buffer: Option<PixelBuffer>,
    frame_number: u64,
}

#[derive(Debug)]
struct QueueState {
    slots: Vec<Slot>,
    queued: VecDeque<usize>,
    connected: bool,
    next_frame: u64,
    last_presented: Option<PixelBuffer>,
}

#[derive(Debug)]
struct Shared {
    name: String,
    width: u32,
    height: u32,
    max_buffers: usize,
    state: Mutex<QueueState>,
}

/// Factory for connected producer/consumer pairs.
pub struct BufferQueue;

impl BufferQueue {
    /// Creates a queue of `max_buffers` slots of `width` x `height` pixels.
    pub fn create(
        name: impl Into<String>,
        width: u32,
        height: u32,
        max_buffers: usize,
    ) -> (Arc<QueueSurface>, Arc<QueueConsumer>) {
        let max_buffers = max_buffers.max(1);
        let slots = (0..max_buffers)
            .map(|_| Slot {
                state: SlotState::Free,
                buffer: None,
                frame_number: 0,
            })
            .collect();
        let shared = Arc::new(Shared {
            name: name.into(),
            width,
            height,
            max_buffers,
            state: Mutex::new(QueueState {
                slots,
                queued: VecDeque::new(),
                connected: false,
                next_frame: 1,
                last_presented: None,
            }),
        });
        log::debug!(
            "Created buffer queue '{}' ({width}x{height}, {max_buffers} buffers)",
            shared.name
        );
        (
            Arc::new(QueueSurface {
                shared: shared.clone(),
            }),
            Arc::new(QueueConsumer { shared }),
        )
    }
}

/// The producer end of a [`BufferQueue`].
#[derive(Debug)]
pub struct QueueSurface {
    shared: Arc<Shared>,
}

impl QueueSurface {
    /// Whether a context is connected.
    pub fn is_connected(&self) -> bool {
        self.shared.state.lock().unwrap().connected
    }

    /// Number of buffers handed to the consumer so far.
    pub fn frames_queued(&self) -> u64 {
        self.shared.state.lock().unwrap().next_frame - 1
    }
}

impl PresentationSurface for QueueSurface {
    fn name(&self) -> &str {
        &self.shared.name
    }

    fn size(&self) -> (u32, u32) {
        (self.shared.width, self.shared.height)
    }

    fn connect(&self) -> Result<(), BufferError> {
        let mut state = self.shared.state.lock().unwrap();
        if state.connected {
            return Err(BufferError::AlreadyConnected);
        }
        state.connected = true;
        Ok(())
    }

    fn disconnect(&self) {
        let mut state = self.shared.state.lock().unwrap();
        state.connected = false;
        for slot in state.slots.iter_mut() {
            if slot.state == SlotState::Dequeued {
                slot.state = SlotState::Free;
            }
        }
    }

    fn dequeue_buffer(&self) -> Result<BufferItem, BufferError> {
        let mut state = self.shared.state.lock().unwrap();
        if !state.connected {
            return Err(BufferError::NotConnected);
        }
        let (width, height) = (self.shared.width, self.shared.height);
        let Some(index) = state.slots.iter().position(|s| s.state == SlotState::Free) else {
            return Err(BufferError::NoFreeBuffer {
                max: self.shared.max_buffers,
            });
        };
        let slot = &mut state.slots[index];
        slot.state = SlotState::Dequeued;
        let buffer = slot
            .buffer
            .take()
            .filter(|b| b.width == width && b.height == height)
            .unwrap_or_else(|| PixelBuffer::new(width, height));
        Ok(BufferItem {
            slot: index,
            frame_number: 0,
            buffer: Some(buffer),
        })
    }

    fn queue_buffer(&self, item: BufferItem) -> Result<(), BufferError> {
        let mut state = self.shared.state.lock().unwrap();
        if !state.connected {
            return Err(BufferError::NotConnected);
        }
        match state.slots.get(item.slot) {
            Some(slot) if slot.state == SlotState::Dequeued => {}
            _ => return Err(BufferError::NotAcquired(item.slot as u64)),
        }

        // Replace a buffer the consumer has not picked up yet.
        while let Some(stale) = state.queued.pop_front() {
            state.slots[stale].state = SlotState::Free;
        }

        let frame_number = state.next_frame;
        state.next_frame += 1;
        state.last_presented = item.buffer.clone();
        let slot = &mut state.slots[item.slot];
        slot.state = SlotState::Queued;
        slot.buffer = item.buffer;
        slot.frame_number = frame_number;
        state.queued.push_back(item.slot);
        log::trace!("Queued frame {frame_number} on '{}'", self.shared.name);
        Ok(())
    }

    fn allocate_buffers(&self) {
        let mut state = self.shared.state.lock().unwrap();
        let (width, height) = (self.shared.width, self.shared.height);
        for slot in state.slots.iter_mut() {
            if slot.state == SlotState::Free && slot.buffer.is_none() {
                slot.buffer = Some(PixelBuffer::new(width, height));
            }
        }
    }

    fn read_back(&self) -> Option<PixelBuffer> {
        self.shared.state.lock().unwrap().last_presented.clone()
    }
}

/// The consumer end of a [`BufferQueue`].
#[derive(Debug)]
pub struct QueueConsumer {
    shared: Arc<Shared>,
}

impl QueueConsumer {
    /// Number of buffers waiting to be acquired.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().unwrap().queued.len()
    }
}

impl BufferConsumer for QueueConsumer {
    fn acquire_buffer(&self) -> Result<BufferItem, BufferError> {
        let mut state = self.shared.state.lock().unwrap();
        let index = state
            .queued
            .pop_front()
            .ok_or(BufferError::NoBufferAvailable)?;
        let slot = &mut state.slots[index];
        slot.state = SlotState::Acquired;
        Ok(BufferItem {
            slot: index,
            frame_number: slot.frame_number,
            buffer: slot.buffer.take(),
        })
    }

    fn release_buffer(&self, item: BufferItem) -> Result<(), BufferError> {
        let mut state = self.shared.state.lock().unwrap();
        match state.slots.get_mut(item.slot) {
            Some(slot) if slot.state == SlotState::Acquired => {
                slot.state = SlotState::Free;
                slot.buffer = item.buffer;
                Ok(())
            }
            _ => Err(BufferError::NotAcquired(item.slot as u64)),
        }
    }

    fn max_buffer_count(&self) -> usize {
        self.shared.max_buffers
    }
}
