//! Bounded hand-off buffer between pointer input dispatch and the render loop.
//!
//! Input handlers `push` as events arrive; the render loop calls `drain` once per frame.
//! Under sustained backpressure the oldest events are evicted so the newest input always
//! survives.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};

pub const DEFAULT_POINTER_QUEUE_CAPACITY: usize = 128;

#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerEventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerCancel,
}

/// Normalized device coordinates (`-1..=1` on both axes), used for picking into the scene.
#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ndc {
    pub x: f32,
    pub y: f32,
}

#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerInputEvent {
    #[serde(rename = "type")]
    pub kind: PointerEventKind,
    pub pointer_id: i32,
    pub ndc: Ndc,
    pub client_x: f64,
    pub client_y: f64,
    pub screen_x: f64,
    pub screen_y: f64,
    pub button: i16,
    pub buttons: u16,
    /// Monotonic timestamp in milliseconds.
    pub time_ms: f64,
}

impl PointerInputEvent {
    pub fn is_press(&self) -> bool {
        matches!(self.kind, PointerEventKind::PointerDown)
    }

    pub fn is_release(&self) -> bool {
        matches!(
            self.kind,
            PointerEventKind::PointerUp | PointerEventKind::PointerCancel
        )
    }

    /// Primary button held according to the `buttons` bitmask.
    pub fn primary_held(&self) -> bool {
        self.buttons & 0x1 != 0
    }
}

#[derive(Clone)]
pub struct PointerEventQueue {
    inner: Arc<Inner>,
}

struct Inner {
    capacity: usize,
    events: Mutex<VecDeque<PointerInputEvent>>,
    evicted: AtomicU64,
}

impl Default for PointerEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerEventQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POINTER_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Inner {
                capacity,
                events: Mutex::new(VecDeque::with_capacity(capacity)),
                evicted: AtomicU64::new(0),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Total number of events discarded by overflow since creation.
    pub fn evicted_total(&self) -> u64 {
        self.inner.evicted.load(Ordering::Relaxed)
    }

    pub fn push(&self, event: PointerInputEvent) {
        let mut events = self.lock();
        events.push_back(event);

        let mut evicted = 0u64;
        while events.len() > self.inner.capacity {
            events.pop_front();
            evicted += 1;
        }
        drop(events);

        if evicted > 0 {
            let total = self.inner.evicted.fetch_add(evicted, Ordering::Relaxed) + evicted;
            log::trace!(
                "Pointer queue full: evicted {} oldest event(s) (total={})",
                evicted,
                total
            );
        }
    }

    /// Take every queued event in push order, leaving the queue empty.
    ///
    /// The swap happens under a single lock acquisition: an event is either part of this
    /// batch or of the next one, never both and never neither.
    pub fn drain(&self) -> Vec<PointerInputEvent> {
        let mut events = self.lock();
        if events.is_empty() {
            return Vec::new();
        }
        let batch = std::mem::replace(
            &mut *events,
            VecDeque::with_capacity(self.inner.capacity),
        );
        drop(events);
        Vec::from(batch)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PointerInputEvent>> {
        // A panic while holding the lock cannot leave the deque half-updated, so keep using it.
        self.inner
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
pub(crate) fn test_event(kind: PointerEventKind, time_ms: f64) -> PointerInputEvent {
    PointerInputEvent {
        kind,
        pointer_id: 1,
        ndc: Ndc::default(),
        client_x: 0.0,
        client_y: 0.0,
        screen_x: 0.0,
        screen_y: 0.0,
        button: 0,
        buttons: 0,
        time_ms,
    }
}
