//! Broadcast throttling.
//!
//! A broadcast is held back only when it comes too soon after the previous
//! one *and* nothing structural changed. A newly settled round always goes
//! out immediately.

use std::time::{Duration, Instant};

use crate::game::{Fingerprint, RoundStatus};

#[derive(Debug)]
pub struct Throttle {
    active_interval: Duration,
    slow_interval: Duration,
    last_emit: Option<Instant>,
    last_fingerprint: Option<Fingerprint>,
    last_result_round: Option<u64>,
}

impl Throttle {
    pub fn new(active_interval: Duration, slow_interval: Duration) -> Self {
        Self {
            active_interval,
            slow_interval,
            last_emit: None,
            last_fingerprint: None,
            last_result_round: None,
        }
    }

    /// Minimum gap between broadcasts in `status`.
    pub fn min_interval(&self, status: RoundStatus) -> Duration {
        match status {
            RoundStatus::Dealer | RoundStatus::RoundOver => self.slow_interval,
            _ => self.active_interval,
        }
    }

    /// Decides whether a broadcast may go out now.
    ///
    /// # Arguments
    ///
    /// * `fingerprint` - Current room fingerprint
    /// * `result_round` - Round counter of the visible round result, if any
    /// * `now` - Current time
    pub fn should_emit(
        &self,
        fingerprint: Fingerprint,
        result_round: Option<u64>,
        now: Instant,
    ) -> bool {
        if result_round.is_some() && result_round != self.last_result_round {
            return true;
        }
        let Some(last_emit) = self.last_emit else {
            return true;
        };
        let too_soon =
            now.saturating_duration_since(last_emit) < self.min_interval(fingerprint.status);
        let unchanged = self.last_fingerprint == Some(fingerprint);
        !(too_soon && unchanged)
    }

    /// Notes that a broadcast went out.
    pub fn record(&mut self, fingerprint: Fingerprint, result_round: Option<u64>, now: Instant) {
        self.last_emit = Some(now);
        self.last_fingerprint = Some(fingerprint);
        if result_round.is_some() {
            self.last_result_round = result_round;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint(status: RoundStatus, player_count: usize) -> Fingerprint {
        Fingerprint {
            status,
            active_player_id: None,
            active_hand_index: 0,
            player_count,
            round_counter: 1,
        }
    }

    fn throttle() -> Throttle {
        Throttle::new(Duration::from_millis(100), Duration::from_millis(300))
    }

    #[test]
    fn test_first_emission_always_allowed() {
        let t = throttle();
        assert!(t.should_emit(fingerprint(RoundStatus::Betting, 1), None, Instant::now()));
    }

    #[test]
    fn test_unchanged_within_interval_suppressed() {
        let mut t = throttle();
        let fp = fingerprint(RoundStatus::Playing, 2);
        let start = Instant::now();
        t.record(fp, None, start);

        assert!(!t.should_emit(fp, None, start + Duration::from_millis(50)));
        assert!(t.should_emit(fp, None, start + Duration::from_millis(100)));
    }

    #[test]
    fn test_structural_change_bypasses_interval() {
        let mut t = throttle();
        let start = Instant::now();
        t.record(fingerprint(RoundStatus::Playing, 2), None, start);
        let changed = fingerprint(RoundStatus::Playing, 3);
        assert!(t.should_emit(changed, None, start + Duration::from_millis(1)));
    }

    #[test]
    fn test_slow_phases_use_longer_interval() {
        let mut t = throttle();
        let fp = fingerprint(RoundStatus::Dealer, 2);
        let start = Instant::now();
        t.record(fp, None, start);

        assert!(!t.should_emit(fp, None, start + Duration::from_millis(200)));
        assert!(t.should_emit(fp, None, start + Duration::from_millis(300)));
        assert_eq!(
            t.min_interval(RoundStatus::RoundOver),
            Duration::from_millis(300)
        );
    }

    #[test]
    fn test_new_round_result_never_suppressed() {
        let mut t = throttle();
        let fp = fingerprint(RoundStatus::RoundOver, 2);
        let start = Instant::now();
        t.record(fp, None, start);

        let soon = start + Duration::from_millis(10);
        assert!(t.should_emit(fp, Some(1), soon));
        t.record(fp, Some(1), soon);
        assert!(!t.should_emit(fp, Some(1), soon + Duration::from_millis(10)));
    }
}
