//! Cancellable virtual-time timers.
//!
//! A [`TimerQueue`] holds events scheduled for a point on the session clock
//! (a [`Duration`] since the session was created). Nothing fires on its
//! own: the owner asks for [`TimerQueue::next_deadline`] and pops due
//! events with [`TimerQueue::pop_due`] as it advances its clock. This keeps
//! every pending timer visible to the owner, so cancelling a phase is a
//! matter of clearing its queue and no stale callback can fire later.

use std::collections::BTreeMap;
use std::time::Duration;

/// Handle to a scheduled timer, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Ordered set of pending timers carrying events of type `E`.
///
/// Timers fire in deadline order; timers sharing a deadline fire in the
/// order they were scheduled.
#[derive(Debug)]
pub struct TimerQueue<E> {
    pending: BTreeMap<(Duration, TimerId), E>,
    next_id: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Schedule `event` to fire at clock time `at`.
    pub fn schedule(&mut self, at: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert((at, id), event);
        id
    }

    /// Cancel a pending timer, returning its event if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        let key = self.pending.keys().find(|(_, pending)| *pending == id).copied()?;
        self.pending.remove(&key)
    }

    /// Cancel every pending timer. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Deadline of the earliest pending timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.first_key_value().map(|((at, _), _)| *at)
    }

    /// Remove and return the earliest timer if it is due at `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, E)> {
        if self.next_deadline()? > now {
            return None;
        }
        self.pending.pop_first().map(|((at, _), event)| (at, event))
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no timer is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
