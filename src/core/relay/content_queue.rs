// FIFO buffer of channel posts waiting to be relayed.

use super::relay_models::QueuedContent;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Unbounded FIFO of pending posts.
///
/// The lock only ever covers a single push or pop.
#[derive(Default)]
pub struct ContentQueue {
    items: Mutex<VecDeque<QueuedContent>>,
}

impl ContentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the back. Returns the new queue length.
    pub fn enqueue(&self, content: QueuedContent) -> usize {
        let mut items = self.lock();
        items.push_back(content);
        items.len()
    }

    /// Remove and return the oldest entry.
    pub fn dequeue_front(&self) -> Option<QueuedContent> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<QueuedContent>> {
        // push/pop never leave the deque half-updated, poisoned or not.
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
