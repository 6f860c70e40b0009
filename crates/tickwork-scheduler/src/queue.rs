//! FIFO of pending notifications with an atomic drain.

use std::collections::VecDeque;

use crate::types::Notification;

/// Not synchronised on its own; [`crate::state::SharedState`] keeps it behind
/// a lock, which is what makes [`NotificationQueue::drain_all`] atomic with
/// respect to concurrent enqueues.
#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    items: VecDeque<Notification>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, notification: Notification) {
        self.items.push_back(notification);
    }

    /// Remove and return everything currently queued, oldest first. An empty
    /// queue returns an empty vec and is left untouched.
    pub fn drain_all(&mut self) -> Vec<Notification> {
        if self.items.is_empty() {
            return Vec::new();
        }
        Vec::from(std::mem::take(&mut self.items))
    }

    /// Copy of the queue contents without draining.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note(subject: &str) -> Notification {
        Notification::new("ops@example.com", subject, "body", Utc::now())
    }

    #[test]
    fn drain_returns_fifo_and_empties() {
        let mut queue = NotificationQueue::new();
        queue.enqueue(note("a"));
        queue.enqueue(note("b"));
        queue.enqueue(note("c"));

        let drained: Vec<String> = queue.drain_all().into_iter().map(|n| n.subject).collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn enqueue_after_drain_lands_in_next_drain() {
        let mut queue = NotificationQueue::new();
        queue.enqueue(note("first"));
        let first = queue.drain_all();
        queue.enqueue(note("second"));
        let second = queue.drain_all();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].subject, "first");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].subject, "second");
    }

    #[test]
    fn drain_on_empty_returns_nothing() {
        let mut queue = NotificationQueue::new();
        assert!(queue.drain_all().is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn snapshot_does_not_drain() {
        let mut queue = NotificationQueue::new();
        queue.enqueue(note("kept"));
        assert_eq!(queue.snapshot().len(), 1);
        assert_eq!(queue.len(), 1);
    }
}
