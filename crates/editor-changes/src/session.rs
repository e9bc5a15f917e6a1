//! Per-document tracking state.

use crate::diff::ChangedRange;

/// Coarse state of a [`TrackerSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing scheduled, nothing running.
    Idle,
    /// At least one debounce timer is still outstanding.
    PendingRecompute,
    /// A recomputation is running.
    Computing,
}

/// State kept for one open document.
///
/// The stored ranges are always true spans; highlight-mode projection happens at render time.
#[derive(Debug, Clone, Default)]
pub struct TrackerSession {
    ranges: Vec<ChangedRange>,
    cursor: usize,
    pending: usize,
    in_flight: Option<u64>,
    generation: u64,
    reveal_on_result: bool,
}

impl TrackerSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Changed ranges from the most recent successful recomputation.
    pub fn ranges(&self) -> &[ChangedRange] {
        &self.ranges
    }

    /// Index of the range the next "goto next change" will reveal.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of outstanding debounce timers.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Returns `true` while a recomputation is running.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Save generation; bumped by every save.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current coarse state.
    pub fn state(&self) -> SessionState {
        if self.in_flight.is_some() {
            SessionState::Computing
        } else if self.pending > 0 {
            SessionState::PendingRecompute
        } else {
            SessionState::Idle
        }
    }

    pub(crate) fn in_flight_job(&self) -> Option<u64> {
        self.in_flight
    }

    pub(crate) fn note_edit(&mut self) {
        self.pending += 1;
    }

    /// Returns `true` when the last outstanding timer fired.
    pub(crate) fn timer_elapsed(&mut self) -> bool {
        self.pending = self.pending.saturating_sub(1);
        self.pending == 0
    }

    /// Claim the in-flight slot for `job`. Fails if another job holds it.
    pub(crate) fn try_begin(&mut self, job: u64) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.in_flight = Some(job);
        true
    }

    /// Release the in-flight slot if `job` holds it.
    pub(crate) fn finish(&mut self, job: u64) -> bool {
        if self.in_flight == Some(job) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    /// Store a new range list. Returns `true` if it differs from the previous one.
    ///
    /// The cursor is reset when the list changes: an index into the old list means nothing for
    /// the new one.
    pub(crate) fn replace_ranges(&mut self, ranges: Vec<ChangedRange>) -> bool {
        if ranges == self.ranges {
            return false;
        }
        self.ranges = ranges;
        self.cursor = 0;
        true
    }

    /// Forget all ranges after a save.
    pub(crate) fn clear(&mut self) {
        self.ranges.clear();
        self.cursor = 0;
        self.generation += 1;
        self.reveal_on_result = false;
    }

    /// Reveal the next change once the in-flight result is applied.
    pub(crate) fn defer_reveal(&mut self) {
        self.reveal_on_result = true;
    }

    pub(crate) fn take_deferred_reveal(&mut self) -> bool {
        std::mem::take(&mut self.reveal_on_result)
    }

    /// Range to reveal next, advancing the cursor circularly.
    pub(crate) fn next_change(&mut self) -> Option<ChangedRange> {
        if self.ranges.is_empty() {
            return None;
        }
        let index = self.cursor % self.ranges.len();
        self.cursor = (index + 1) % self.ranges.len();
        Some(self.ranges[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(n: usize) -> Vec<ChangedRange> {
        (0..n).map(|i| ChangedRange::new(i * 10, i * 10 + 3)).collect()
    }

    #[test]
    fn test_state_transitions() {
        let mut session = TrackerSession::new();
        assert_eq!(session.state(), SessionState::Idle);

        session.note_edit();
        session.note_edit();
        assert_eq!(session.state(), SessionState::PendingRecompute);
        assert!(!session.timer_elapsed());
        assert!(session.timer_elapsed());
        assert_eq!(session.state(), SessionState::Idle);

        assert!(session.try_begin(7));
        assert_eq!(session.state(), SessionState::Computing);
        assert!(!session.try_begin(8));
        assert!(!session.finish(8));
        assert!(session.finish(7));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_extra_timer_does_not_underflow() {
        let mut session = TrackerSession::new();
        assert!(session.timer_elapsed());
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn test_next_change_wraps() {
        let mut session = TrackerSession::new();
        assert_eq!(session.next_change(), None);

        session.replace_ranges(ranges(3));
        let visited: Vec<_> = (0..3).filter_map(|_| session.next_change()).collect();
        assert_eq!(visited, ranges(3));
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.next_change(), Some(ranges(3)[0]));
    }

    #[test]
    fn test_cursor_survives_identical_ranges() {
        let mut session = TrackerSession::new();
        assert!(session.replace_ranges(ranges(3)));
        session.next_change();
        assert!(!session.replace_ranges(ranges(3)));
        assert_eq!(session.cursor(), 1);

        assert!(session.replace_ranges(ranges(2)));
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_clear_bumps_generation() {
        let mut session = TrackerSession::new();
        session.replace_ranges(ranges(2));
        session.next_change();
        session.clear();
        assert!(session.ranges().is_empty());
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_save_drops_deferred_reveal() {
        let mut session = TrackerSession::new();
        session.defer_reveal();
        session.clear();
        assert!(!session.take_deferred_reveal());

        session.defer_reveal();
        assert!(session.take_deferred_reveal());
        assert!(!session.take_deferred_reveal());
    }
}
