#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cooperative timer queue driven by a virtual monotonic clock.
//!
//! Timers never fire on their own: the owner advances the clock by draining
//! due timers one at a time with [`TimerQueue::pop_due`] and then settling the
//! clock with [`TimerQueue::advance_to`]. Draining one timer per call lets the
//! owner run each callback as a discrete step and schedule follow-up timers
//! relative to the instant the previous one fired.
//!
//! Handles carry the generation of the slot they were allocated from, so
//! cancelling a timer that already fired or was already cancelled is a
//! harmless `false`, even after the slot has been reused.

use std::{cmp::Reverse, collections::BinaryHeap, time::Duration};

/// Handle returned to callers; includes index and generation to detect stale use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    index: usize,
    generation: u32,
}

/// Timer that reached its deadline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired<T> {
    /// Instant the timer was due, measured on the queue clock.
    pub deadline: Duration,
    /// Payload supplied when the timer was scheduled.
    pub payload: T,
}

#[derive(Debug)]
struct Entry<T> {
    generation: u32,
    payload: Option<T>,
}

// Heap records are ordered by deadline, then by scheduling order so timers
// sharing a deadline fire first-in first-out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Pending {
    deadline: Duration,
    sequence: u64,
    index: usize,
    generation: u32,
}

/// Queue of one-shot timers keyed by virtual deadline.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Duration,
    entries: Vec<Entry<T>>,
    free: Vec<usize>,
    pending: BinaryHeap<Reverse<Pending>>,
    sequence: u64,
    live: usize,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Creates an empty queue whose clock reads zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            entries: Vec::new(),
            free: Vec::new(),
            pending: BinaryHeap::new(),
            sequence: 0,
            live: 0,
        }
    }

    /// Current reading of the queue clock.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of timers that are scheduled and not yet fired or cancelled.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Reports whether no timer is pending.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Schedules `payload` to fire `delay` after the current clock reading.
    ///
    /// A zero delay fires on the next drain.
    pub fn schedule(&mut self, delay: Duration, payload: T) -> TimerHandle {
        let deadline = self.now.saturating_add(delay);
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.entries.push(Entry {
                    generation: 0,
                    payload: None,
                });
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[index];
        entry.payload = Some(payload);
        let generation = entry.generation;

        self.pending.push(Reverse(Pending {
            deadline,
            sequence: self.sequence,
            index,
            generation,
        }));
        self.sequence = self.sequence.wrapping_add(1);
        self.live += 1;

        TimerHandle { index, generation }
    }

    /// Cancels a pending timer, returning whether it was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if !self.is_pending(handle) {
            return false;
        }
        let _ = self.release(handle.index);
        self.prune();
        true
    }

    /// Reports whether the handle refers to a timer that has neither fired nor been cancelled.
    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries
            .get(handle.index)
            .is_some_and(|entry| entry.generation == handle.generation && entry.payload.is_some())
    }

    /// Deadline of the earliest pending timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.peek().map(|Reverse(record)| record.deadline)
    }

    /// Removes and returns the earliest timer due at or before `horizon`.
    ///
    /// The clock moves forward to the fired timer's deadline. Returns `None`
    /// once nothing is due, leaving the clock untouched.
    pub fn pop_due(&mut self, horizon: Duration) -> Option<Fired<T>> {
        while let Some(Reverse(record)) = self.pending.peek().copied() {
            if record.deadline > horizon {
                return None;
            }
            let _ = self.pending.pop();
            if !self.is_live(&record) {
                continue;
            }

            let payload = self.release(record.index)?;
            self.prune();
            self.now = self.now.max(record.deadline);
            return Some(Fired {
                deadline: record.deadline,
                payload,
            });
        }
        None
    }

    /// Moves the clock forward to `horizon`; the clock never runs backwards.
    pub fn advance_to(&mut self, horizon: Duration) {
        self.now = self.now.max(horizon);
    }

    /// Cancels every pending timer. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for index in 0..self.entries.len() {
            if self.entries[index].payload.is_some() {
                let _ = self.release(index);
            }
        }
        self.pending.clear();
    }

    // Keeps the heap head live so `next_deadline` can peek.
    fn prune(&mut self) {
        while let Some(Reverse(record)) = self.pending.peek().copied() {
            if self.is_live(&record) {
                break;
            }
            let _ = self.pending.pop();
        }
    }

    fn is_live(&self, record: &Pending) -> bool {
        self.entries.get(record.index).is_some_and(|entry| {
            entry.generation == record.generation && entry.payload.is_some()
        })
    }

    fn release(&mut self, index: usize) -> Option<T> {
        let entry = self.entries.get_mut(index)?;
        let payload = entry.payload.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(index);
        self.live -= 1;
        Some(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TimerQueue<&'static str>, horizon: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some(timer) = queue.pop_due(horizon) {
            fired.push(timer.payload);
        }
        queue.advance_to(horizon);
        fired
    }

    #[test]
    fn fires_in_deadline_then_schedule_order() {
        let mut queue = TimerQueue::new();
        let _ = queue.schedule(Duration::from_millis(30), "late");
        let _ = queue.schedule(Duration::from_millis(10), "first");
        let _ = queue.schedule(Duration::from_millis(10), "second");

        assert_eq!(
            drain(&mut queue, Duration::from_millis(30)),
            vec!["first", "second", "late"]
        );
        assert!(queue.is_empty());
        assert_eq!(queue.now(), Duration::from_millis(30));
    }

    #[test]
    fn pop_due_moves_clock_to_fired_deadline() {
        let mut queue = TimerQueue::new();
        let _ = queue.schedule(Duration::from_millis(250), "tick");

        let fired = queue.pop_due(Duration::from_secs(1)).expect("due");
        assert_eq!(fired.deadline, Duration::from_millis(250));
        assert_eq!(queue.now(), Duration::from_millis(250));

        let _ = queue.schedule(Duration::from_millis(250), "follow-up");
        assert_eq!(queue.next_deadline(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut queue = TimerQueue::new();
        let doomed = queue.schedule(Duration::from_millis(5), "doomed");
        let _ = queue.schedule(Duration::from_millis(5), "kept");

        assert!(queue.cancel(doomed));
        assert!(!queue.cancel(doomed), "second cancel reports stale handle");
        assert_eq!(queue.len(), 1);
        assert_eq!(drain(&mut queue, Duration::from_millis(5)), vec!["kept"]);
    }

    #[test]
    fn stale_handle_cannot_cancel_reused_slot() {
        let mut queue = TimerQueue::new();
        let old = queue.schedule(Duration::from_millis(1), "old");
        assert_eq!(drain(&mut queue, Duration::from_millis(1)), vec!["old"]);

        let fresh = queue.schedule(Duration::from_millis(1), "fresh");
        assert!(!queue.cancel(old));
        assert!(queue.is_pending(fresh));
        assert_eq!(drain(&mut queue, Duration::from_millis(2)), vec!["fresh"]);
    }

    #[test]
    fn clear_invalidates_all_handles() {
        let mut queue = TimerQueue::new();
        let first = queue.schedule(Duration::from_millis(1), "a");
        let _ = queue.schedule(Duration::from_millis(2), "b");

        queue.clear();

        assert!(queue.is_empty());
        assert!(!queue.cancel(first));
        assert_eq!(queue.next_deadline(), None);
        assert!(drain(&mut queue, Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn cancelled_head_is_discarded() {
        let mut queue = TimerQueue::new();
        let first = queue.schedule(Duration::from_millis(1), "first");
        let second = queue.schedule(Duration::from_millis(2), "second");
        let _ = queue.schedule(Duration::from_millis(3), "third");

        assert!(queue.cancel(second));
        assert_eq!(queue.pending.len(), 3, "buried records wait until they surface");
        assert!(queue.cancel(first));

        assert_eq!(queue.next_deadline(), Some(Duration::from_millis(3)));
        assert_eq!(queue.pending.len(), 1);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut queue: TimerQueue<()> = TimerQueue::new();
        queue.advance_to(Duration::from_secs(2));
        queue.advance_to(Duration::from_secs(1));
        assert_eq!(queue.now(), Duration::from_secs(2));
    }
}
