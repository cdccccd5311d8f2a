//! Cooperative timer queue
//!
//! One-shot timers keyed by engine time (seconds). Repeating behaviour is
//! obtained by re-arming from the handler. Every timer carries the generation
//! token that was current when it was armed; the owner compares it against
//! its live token on fire, so a timer armed for a finished trial is a no-op
//! even if it was never removed from the queue.

use tracing::trace;

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Spawn the next target (initial delay or post-trial hold)
    Spawn,
    /// Advance the active target by one step
    Move,
    /// Give up on the active target
    Timeout,
}

/// A timer waiting in the queue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTimer {
    /// Engine time at which the timer fires
    pub due: f64,
    pub kind: TimerKind,
    /// Token of the trial (or hold) the timer belongs to
    pub generation: u64,
    seq: u64,
}

/// Pending timers ordered by due time, then by arming order
#[derive(Debug, Default)]
pub struct TimerQueue {
    pending: Vec<ScheduledTimer>,
    next_seq: u64,
    last_generation: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh generation token
    ///
    /// Tokens increase monotonically for the lifetime of the queue and are
    /// never reused, including across `cancel_all`.
    pub fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    /// Arm a timer
    pub fn schedule(&mut self, due: f64, kind: TimerKind, generation: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        trace!(due, ?kind, generation, "timer armed");
        self.pending.push(ScheduledTimer {
            due,
            kind,
            generation,
            seq,
        });
    }

    /// Remove every pending timer of the given kind
    pub fn cancel(&mut self, kind: TimerKind) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| t.kind != kind);
        before - self.pending.len()
    }

    /// Remove every pending timer armed with the given token
    pub fn cancel_generation(&mut self, generation: u64) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| t.generation != generation);
        before - self.pending.len()
    }

    /// Remove every pending timer
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Take the earliest timer due at or before `now`
    pub fn pop_due(&mut self, now: f64) -> Option<ScheduledTimer> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)?;
        Some(self.pending.swap_remove(idx))
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<f64> {
        self.pending
            .iter()
            .map(|t| t.due)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|t| t.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_due_in_time_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(0.3, TimerKind::Timeout, 1);
        queue.schedule(0.1, TimerKind::Move, 1);
        queue.schedule(0.2, TimerKind::Spawn, 1);

        assert_eq!(queue.pop_due(1.0).unwrap().kind, TimerKind::Move);
        assert_eq!(queue.pop_due(1.0).unwrap().kind, TimerKind::Spawn);
        assert_eq!(queue.pop_due(1.0).unwrap().kind, TimerKind::Timeout);
        assert!(queue.pop_due(1.0).is_none());
    }

    #[test]
    fn test_ties_fire_in_arming_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(0.5, TimerKind::Timeout, 1);
        queue.schedule(0.5, TimerKind::Move, 1);

        assert_eq!(queue.pop_due(0.5).unwrap().kind, TimerKind::Timeout);
        assert_eq!(queue.pop_due(0.5).unwrap().kind, TimerKind::Move);
    }

    #[test]
    fn test_future_timers_stay_pending() {
        let mut queue = TimerQueue::new();
        queue.schedule(2.0, TimerKind::Timeout, 1);
        assert!(queue.pop_due(1.999).is_none());
        assert_eq!(queue.next_due(), Some(2.0));
        assert!(queue.pop_due(2.0).is_some());
    }

    #[test]
    fn test_cancel_by_kind_and_generation() {
        let mut queue = TimerQueue::new();
        queue.schedule(1.0, TimerKind::Move, 1);
        queue.schedule(1.0, TimerKind::Timeout, 1);
        queue.schedule(2.0, TimerKind::Spawn, 2);

        assert_eq!(queue.cancel(TimerKind::Timeout), 1);
        assert!(!queue.contains(TimerKind::Timeout));
        assert_eq!(queue.cancel_generation(1), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.cancel_all(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_generations_are_monotonic() {
        let mut queue = TimerQueue::new();
        let a = queue.next_generation();
        queue.cancel_all();
        let b = queue.next_generation();
        assert!(b > a);
    }
}
