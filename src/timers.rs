use std::{
    cell::Cell,
    cmp::Ordering,
    collections::BinaryHeap,
    rc::Rc,
};

use crate::model::Millis;

/// Shared stop flag for a repeating task. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub(crate) struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub(crate) fn cancel(&self) {
        self.0.set(true);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

struct Entry<T> {
    due: Millis,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // reversed: BinaryHeap is a max-heap, we want the earliest first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// One-shot timers ordered by due time, ties broken by scheduling order.
pub(crate) struct TimerQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub(crate) fn schedule(&mut self, due: Millis, task: T) {
        self.seq += 1;
        self.heap.push(Entry {
            due,
            seq: self.seq,
            task,
        });
    }

    /// Pops the earliest timer if it is due at `now`.
    pub(crate) fn pop_due(&mut self, now: Millis) -> Option<(Millis, T)> {
        if self.heap.peek()?.due > now {
            return None;
        }
        self.heap.pop().map(|e| (e.due, e.task))
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order() {
        let mut q = TimerQueue::default();
        q.schedule(300, "c");
        q.schedule(100, "a");
        q.schedule(200, "b");

        assert!(q.pop_due(50).is_none());
        assert_eq!(q.pop_due(1000), Some((100, "a")));
        assert_eq!(q.pop_due(1000), Some((200, "b")));
        assert_eq!(q.pop_due(1000), Some((300, "c")));
        assert!(q.pop_due(1000).is_none());
    }

    #[test]
    fn ties_keep_scheduling_order() {
        let mut q = TimerQueue::default();
        q.schedule(10, 1);
        q.schedule(10, 2);
        q.schedule(10, 3);
        let got: Vec<_> = std::iter::from_fn(|| q.pop_due(10).map(|(_, t)| t)).collect();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[test]
    fn due_exactly_now_fires() {
        let mut q = TimerQueue::default();
        q.schedule(500, ());
        assert!(q.pop_due(499).is_none());
        assert_eq!(q.len(), 1);
        assert!(q.pop_due(500).is_some());
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn token_clones_share_state() {
        let a = CancelToken::default();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }
}
