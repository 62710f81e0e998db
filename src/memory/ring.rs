//! Bounded, insertion-ordered buffer of recent events.

use std::collections::VecDeque;

use crate::memory::types::MemoryEvent;

/// Default short-term capacity.
pub const DEFAULT_CAPACITY: usize = 30;

/// Fixed-capacity ring; the oldest event is evicted first.
#[derive(Debug, Clone)]
pub struct ShortTermRing {
    capacity: usize,
    events: VecDeque<MemoryEvent>,
}

impl ShortTermRing {
    /// A zero capacity is raised to one so the most recent event is always kept.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    /// Rebuild from events stored oldest-first, keeping only the newest `capacity`.
    pub fn from_events(capacity: usize, events: Vec<MemoryEvent>) -> Self {
        let mut ring = Self::new(capacity);
        let skip = events.len().saturating_sub(ring.capacity);
        ring.events.extend(events.into_iter().skip(skip));
        ring
    }

    /// Append an event, returning the evicted oldest one when full.
    pub fn push(&mut self, event: MemoryEvent) -> Option<MemoryEvent> {
        let evicted = if self.events.len() >= self.capacity {
            self.events.pop_front()
        } else {
            None
        };
        self.events.push_back(event);
        evicted
    }

    /// Up to `limit` events, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<MemoryEvent> {
        self.events.iter().rev().take(limit).cloned().collect()
    }

    /// Events oldest-first (insertion order).
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, MemoryEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
