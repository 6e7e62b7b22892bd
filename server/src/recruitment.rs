//! Shared stop rule for the recruitment window

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct ProgressState {
    players: usize,
    last_admission: Option<Instant>,
    closed: bool,
}

/// Admission progress observed by both the broadcaster and the admitter.
///
/// Recruitment is over once at least one player has been admitted and no
/// other player joined for the quiet period, or once `close` was called.
#[derive(Debug)]
pub struct AdmissionProgress {
    quiet_period: Duration,
    state: Mutex<ProgressState>,
}

impl AdmissionProgress {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// Counts a new player and restarts the quiet period. Returns the new count.
    pub fn record_admission(&self) -> usize {
        self.record_admission_at(Instant::now())
    }

    pub fn record_admission_at(&self, now: Instant) -> usize {
        let mut state = self.lock();
        state.players += 1;
        state.last_admission = Some(now);
        state.players
    }

    pub fn player_count(&self) -> usize {
        self.lock().players
    }

    /// Ends recruitment regardless of the quiet period
    pub fn close(&self) {
        self.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed_at(Instant::now())
    }

    pub fn is_closed_at(&self, now: Instant) -> bool {
        let state = self.lock();
        if state.closed {
            return true;
        }

        match state.last_admission {
            Some(last) if state.players >= 1 => {
                now.saturating_duration_since(last) > self.quiet_period
            }
            _ => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_closes_without_players() {
        let progress = AdmissionProgress::new(Duration::from_secs(10));
        let later = Instant::now() + Duration::from_secs(3600);

        assert!(!progress.is_closed_at(later));
        assert_eq!(progress.player_count(), 0);
    }

    #[test]
    fn test_closes_after_quiet_period() {
        let progress = AdmissionProgress::new(Duration::from_secs(10));
        let start = Instant::now();

        assert_eq!(progress.record_admission_at(start), 1);

        assert!(!progress.is_closed_at(start + Duration::from_secs(5)));
        assert!(!progress.is_closed_at(start + Duration::from_secs(10)));
        assert!(progress.is_closed_at(start + Duration::from_secs(11)));
    }

    #[test]
    fn test_new_admission_extends_window() {
        let progress = AdmissionProgress::new(Duration::from_secs(10));
        let start = Instant::now();

        progress.record_admission_at(start);
        assert_eq!(progress.record_admission_at(start + Duration::from_secs(8)), 2);

        assert!(!progress.is_closed_at(start + Duration::from_secs(12)));
        assert!(progress.is_closed_at(start + Duration::from_secs(19)));
    }

    #[test]
    fn test_explicit_close() {
        let progress = AdmissionProgress::new(Duration::from_secs(10));

        progress.close();

        assert!(progress.is_closed());
        assert_eq!(progress.player_count(), 0);
    }
}
