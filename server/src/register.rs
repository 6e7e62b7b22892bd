//! State shared between a round's coordinator and its answer collectors

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The first correct answer of a round and who gave it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAnswer {
    pub answer: bool,
    pub player: String,
}

/// Single "first correct answer" slot.
///
/// Once filled it is never overwritten until the next `reset`. None of the
/// operations block beyond the short critical section.
#[derive(Debug, Default)]
pub struct AnswerRegister {
    slot: Mutex<Option<RecordedAnswer>>,
}

impl AnswerRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the slot for a new round
    pub fn reset(&self) {
        *self.lock() = None;
    }

    /// Records the answer only if it is correct and the slot is still empty.
    ///
    /// Returns true when this call filled the slot.
    pub fn try_record_if_correct(&self, answer: bool, player: &str, is_correct: bool) -> bool {
        if !is_correct {
            return false;
        }

        let mut slot = self.lock();
        if slot.is_some() {
            return false;
        }

        *slot = Some(RecordedAnswer {
            answer,
            player: player.to_string(),
        });
        true
    }

    pub fn peek(&self) -> Option<RecordedAnswer> {
        self.lock().clone()
    }

    pub fn is_settled(&self) -> bool {
        self.lock().is_some()
    }

    // A panicking collector cannot leave the slot half-written, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Option<RecordedAnswer>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Seconds left in the current answer window.
///
/// Written by the coordinator once per second, read by collectors to decide
/// whether to keep draining input. Only a liveness signal.
#[derive(Debug, Default)]
pub struct RoundDeadline {
    remaining: AtomicU64,
}

impl RoundDeadline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self, window_secs: u64) {
        self.set(window_secs);
    }

    pub fn set(&self, remaining_secs: u64) {
        self.remaining.store(remaining_secs, Ordering::SeqCst);
    }

    /// Marks the window as over
    pub fn close(&self) {
        self.set(0);
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn is_final_second(&self) -> bool {
        self.remaining() <= 1
    }

    pub fn is_closed(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_register_starts_empty() {
        let register = AnswerRegister::new();
        assert_eq!(register.peek(), None);
        assert!(!register.is_settled());
    }

    #[test]
    fn test_first_correct_answer_wins() {
        let register = AnswerRegister::new();

        assert!(register.try_record_if_correct(true, "Alex", true));
        assert!(!register.try_record_if_correct(true, "Jordan", true));
        assert!(!register.try_record_if_correct(false, "Taylor", true));

        assert_eq!(
            register.peek(),
            Some(RecordedAnswer {
                answer: true,
                player: "Alex".to_string(),
            })
        );
    }

    #[test]
    fn test_incorrect_answer_does_not_block_later_correct() {
        let register = AnswerRegister::new();

        assert!(!register.try_record_if_correct(false, "Alex", false));
        assert!(!register.is_settled());

        assert!(register.try_record_if_correct(true, "Jordan", true));
        assert_eq!(register.peek().unwrap().player, "Jordan");
    }

    #[test]
    fn test_reset_clears_slot() {
        let register = AnswerRegister::new();
        register.try_record_if_correct(true, "Alex", true);

        register.reset();

        assert_eq!(register.peek(), None);
        assert!(register.try_record_if_correct(false, "Jordan", true));
    }

    #[test]
    fn test_concurrent_correct_answers_record_exactly_one() {
        let register = Arc::new(AnswerRegister::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let register = Arc::clone(&register);
                thread::spawn(move || register.try_record_if_correct(true, &format!("P{}", i), true))
            })
            .collect();

        let winners: Vec<usize> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .enumerate()
            .filter(|(_, won)| *won)
            .map(|(i, _)| i)
            .collect();

        assert_eq!(winners.len(), 1);
        assert_eq!(register.peek().unwrap().player, format!("P{}", winners[0]));
    }

    #[test]
    fn test_deadline_countdown() {
        let deadline = RoundDeadline::new();
        assert!(deadline.is_closed());

        deadline.reset(10);
        assert_eq!(deadline.remaining(), 10);
        assert!(!deadline.is_final_second());

        deadline.set(1);
        assert!(deadline.is_final_second());
        assert!(!deadline.is_closed());

        deadline.close();
        assert!(deadline.is_closed());
    }
}
