//! Buffer
//! Bounded, newest-first window over the most recent `Event`s.
//!
//! Assumptions:
//! 1. Events are pushed in the order they were generated
//! 2. The buffer is owned by a single view; nothing else mutates it

use crate::data::{Event, EventSource};

use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedBuffer {
    events: VecDeque<Event>,
    capacity: usize,
}

impl FeedBuffer {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Inserts at the head. Returns the oldest record if it had to be evicted.
    pub fn push(&mut self, event: Event) -> Option<Event> {
        self.events.push_front(event);
        if self.events.len() > self.capacity {
            self.events.pop_back()
        } else {
            None
        }
    }

    /// Pushes `n` freshly generated events.
    pub fn seed<S: EventSource + ?Sized>(&mut self, n: usize, source: &mut S) {
        for _ in 0..n {
            self.push(source.next_event());
        }
    }

    pub fn latest(&self) -> Option<&Event> {
        self.events.front()
    }

    pub fn oldest(&self) -> Option<&Event> {
        self.events.back()
    }

    /// Newest first.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for FeedBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<'a> IntoIterator for &'a FeedBuffer {
    type Item = &'a Event;
    type IntoIter = std::collections::vec_deque::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
