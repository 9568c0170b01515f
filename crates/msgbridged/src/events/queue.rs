//! Bounded event buffer with drop-oldest overflow.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use msgbridge_protocol::Event;

/// Number of events buffered before the oldest are discarded.
pub const EVENT_QUEUE_CAPACITY: usize = 200;

/// FIFO of pending events shared between client callbacks and the writer.
///
/// Producers never block: when the queue is full the oldest event is
/// evicted and counted. The single consumer awaits [`EventQueue::pop`].
#[derive(Debug)]
pub struct EventQueue {
    state: Mutex<QueueState>,
    available: Notify,
    capacity: usize,
}

#[derive(Debug, Default)]
struct QueueState {
    events: VecDeque<Event>,
    dropped: u64,
}

impl EventQueue {
    /// Creates a queue holding [`EVENT_QUEUE_CAPACITY`] events.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(EVENT_QUEUE_CAPACITY)
    }

    /// Creates a queue with a custom bound, clamped to at least one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                events: VecDeque::with_capacity(capacity),
                dropped: 0,
            }),
            available: Notify::new(),
            capacity,
        }
    }

    /// Appends an event, returning the evicted event when the queue was full.
    pub fn push(&self, event: Event) -> Option<Event> {
        let evicted = {
            let mut state = self.lock();
            let evicted = if state.events.len() >= self.capacity {
                state.dropped += 1;
                state.events.pop_front()
            } else {
                None
            };
            state.events.push_back(event);
            evicted
        };
        self.available.notify_one();
        evicted
    }

    /// Removes the oldest event without waiting.
    pub fn try_pop(&self) -> Option<Event> {
        self.lock().events.pop_front()
    }

    /// Waits for and removes the oldest event.
    pub async fn pop(&self) -> Event {
        loop {
            let notified = self.available.notified();
            if let Some(event) = self.try_pop() {
                return event;
            }
            notified.await;
        }
    }

    /// Number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    /// Whether no events are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered events.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total events evicted since creation.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    // The state is valid after every statement, so a poisoned lock is safe
    // to reuse.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
