//! One question-and-answer round
//!
//! A round moves through four states:
//!
//! 1. `AwaitingQuestion`: a question is drawn from the question source
//! 2. `QuestionSent`: every active player received the prompt
//! 3. `CollectingAnswers`: one collector task per player reads answers while
//!    the coordinator counts the answer window down once per second
//! 4. `Resolved`: collectors are joined and the result is sent to everyone
//!
//! Collectors race only through the [`AnswerRegister`]: the first *correct*
//! answer to reach it wins, so a wrong answer never blocks a later right one.

use crate::questions::{QuestionRecord, QuestionSource};
use crate::register::{AnswerRegister, RecordedAnswer, RoundDeadline};
use crate::session::{discard_buffered, Roster, READ_BUFFER_SIZE};
use log::{debug, error, info, warn};
use shared::{format_prompt, parse_answer, EXPIRED_SENTINEL};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout, Instant};

/// Granularity of the answer window countdown
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    AwaitingQuestion,
    QuestionSent,
    CollectingAnswers,
    Resolved,
}

/// How a round ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// A player gave the first correct answer; the round set is over
    Won {
        question: QuestionRecord,
        winner: String,
    },
    /// Nobody answered correctly in time; another round should follow
    Expired { question: QuestionRecord },
}

impl RoundOutcome {
    /// Whether the server should draw a new question and play again
    pub fn replay(&self) -> bool {
        matches!(self, RoundOutcome::Expired { .. })
    }

    pub fn winner(&self) -> Option<&str> {
        match self {
            RoundOutcome::Won { winner, .. } => Some(winner),
            RoundOutcome::Expired { .. } => None,
        }
    }

    pub fn question(&self) -> &QuestionRecord {
        match self {
            RoundOutcome::Won { question, .. } | RoundOutcome::Expired { question } => question,
        }
    }

    /// Status text sent to every player when the round resolves
    pub fn status_message(&self) -> String {
        match self {
            RoundOutcome::Won { question, winner } => format!(
                "Game over!\nThe correct answer was {}!\nCongratulations to the winner: {}\n",
                question.answer, winner
            ),
            RoundOutcome::Expired { .. } => EXPIRED_SENTINEL.to_string(),
        }
    }
}

/// Drives rounds over a fixed roster
pub struct RoundCoordinator {
    register: Arc<AnswerRegister>,
    deadline: Arc<RoundDeadline>,
    window_secs: u64,
}

impl RoundCoordinator {
    pub fn new(register: Arc<AnswerRegister>, window_secs: u64) -> Self {
        Self {
            register,
            deadline: Arc::new(RoundDeadline::new()),
            window_secs: window_secs.max(1),
        }
    }

    pub fn register(&self) -> &Arc<AnswerRegister> {
        &self.register
    }

    /// Plays one round and sends its result to every active player.
    ///
    /// Per-player I/O failures only deactivate that player's session.
    pub async fn play_round(
        &self,
        roster: &mut Roster,
        questions: &mut dyn QuestionSource,
    ) -> RoundOutcome {
        let mut state = RoundState::AwaitingQuestion;
        let question = questions.next_question();
        info!("Asking: {}", question.text);

        let prompt = format_prompt(&question.text);
        for session in roster.iter_mut() {
            // Leftovers from the previous round must not count as answers
            session.discard_pending();
            session.send(&prompt).await;
        }
        transition(&mut state, RoundState::QuestionSent);

        self.register.reset();
        self.deadline.reset(self.window_secs);

        let answer_timeout = Duration::from_secs(self.window_secs);
        let mut collectors = JoinSet::new();
        for (index, session) in roster.iter_mut().enumerate() {
            if let Some(stream) = session.take_stream() {
                let collector = AnswerCollector {
                    index,
                    player: session.name().to_string(),
                    correct_answer: question.answer,
                    register: Arc::clone(&self.register),
                    deadline: Arc::clone(&self.deadline),
                    give_up_at: Instant::now() + answer_timeout,
                };
                collectors.spawn(collector.run(stream));
            }
        }
        transition(&mut state, RoundState::CollectingAnswers);

        if collectors.is_empty() {
            debug!("No active players, round expires immediately");
        } else {
            self.await_answer().await;
        }

        // Collectors watch the deadline; closing it lets them all finish
        self.deadline.close();
        while let Some(joined) = collectors.join_next().await {
            match joined {
                Ok((index, Some(stream))) => {
                    if let Some(session) = roster.get_mut(index) {
                        session.restore_stream(stream);
                    }
                }
                // The stream was dropped, so the session stays inactive
                Ok((index, None)) => debug!("Collector {} lost its connection", index),
                Err(e) => error!("Answer collector task failed: {}", e),
            }
        }

        // Read only once every collector is done, so a late correct answer
        // cannot be recorded after the result was decided
        let outcome = self.resolve(question);
        transition(&mut state, RoundState::Resolved);

        let delivered = roster.broadcast(&outcome.status_message()).await;
        debug!("Round result delivered to {} players", delivered);

        outcome
    }

    /// Waits up to the answer window for the register to fill, counting
    /// the shared deadline down once per second
    async fn await_answer(&self) {
        for elapsed in 0..self.window_secs {
            if self.register.is_settled() {
                return;
            }
            self.deadline.set(self.window_secs - elapsed);
            sleep(TICK).await;
        }
    }

    /// Turns the register's final content into the round's outcome
    fn resolve(&self, question: QuestionRecord) -> RoundOutcome {
        match self.register.peek() {
            Some(RecordedAnswer { player, .. }) => {
                info!("{} answered correctly first", player);
                RoundOutcome::Won {
                    question,
                    winner: player,
                }
            }
            None => {
                info!("Round expired without a correct answer");
                RoundOutcome::Expired { question }
            }
        }
    }
}

fn transition(state: &mut RoundState, next: RoundState) {
    debug!("Round state {:?} -> {:?}", state, next);
    *state = next;
}

/// Reads one player's answers during a round
struct AnswerCollector {
    index: usize,
    player: String,
    correct_answer: bool,
    register: Arc<AnswerRegister>,
    deadline: Arc<RoundDeadline>,
    give_up_at: Instant,
}

impl AnswerCollector {
    /// Returns the roster index and the stream, or `None` in place of the
    /// stream if the connection failed
    async fn run(self, mut stream: TcpStream) -> (usize, Option<TcpStream>) {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let mut answered = false;

        loop {
            if self.register.is_settled() {
                break;
            }
            // Before answering the player keeps the full window; afterwards
            // input is only drained until the final second.
            if self.deadline.is_closed() || (answered && self.deadline.is_final_second()) {
                break;
            }

            let now = Instant::now();
            if now >= self.give_up_at {
                if !answered {
                    info!("{} ran out of time", self.player);
                }
                break;
            }
            let wait = (self.give_up_at - now).min(TICK);

            let n = match timeout(wait, stream.read(&mut buf)).await {
                Err(_) => continue,
                Ok(Ok(0)) => {
                    info!("{} closed the connection", self.player);
                    return (self.index, None);
                }
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    warn!("Lost connection to {}: {}", self.player, e);
                    return (self.index, None);
                }
            };

            if answered {
                debug!("Discarding {} extra bytes from {}", n, self.player);
                continue;
            }

            let token = String::from_utf8_lossy(&buf[..n]);
            match parse_answer(&token) {
                Ok(answer) => {
                    answered = true;
                    let correct = answer == self.correct_answer;
                    if self
                        .register
                        .try_record_if_correct(answer, &self.player, correct)
                    {
                        info!("{} answered {} and was first", self.player, answer);
                    } else {
                        debug!("{} answered {} (correct: {})", self.player, answer, correct);
                    }
                }
                Err(e) => warn!("Invalid answer from {}: {}", self.player, e),
            }
        }

        match discard_buffered(&stream) {
            Ok(_) => (self.index, Some(stream)),
            Err(e) => {
                info!("Connection to {} ended: {}", self.player, e);
                (self.index, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: bool) -> QuestionRecord {
        QuestionRecord::new("Cats can bark", answer)
    }

    #[test]
    fn test_expired_outcome_replays() {
        let outcome = RoundOutcome::Expired {
            question: question(false),
        };

        assert!(outcome.replay());
        assert_eq!(outcome.winner(), None);
        assert_eq!(outcome.status_message(), EXPIRED_SENTINEL);
    }

    #[test]
    fn test_won_outcome_names_winner() {
        let outcome = RoundOutcome::Won {
            question: question(true),
            winner: "Alex".to_string(),
        };

        assert!(!outcome.replay());
        assert_eq!(outcome.winner(), Some("Alex"));

        let message = outcome.status_message();
        assert!(message.starts_with("Game over!"));
        assert!(message.contains("The correct answer was true!"));
        assert!(message.contains("Congratulations to the winner: Alex"));
        assert_ne!(message, EXPIRED_SENTINEL);
    }

    #[test]
    fn test_window_is_at_least_one_second() {
        let coordinator = RoundCoordinator::new(Arc::new(AnswerRegister::new()), 0);
        assert_eq!(coordinator.window_secs, 1);
    }

    #[test]
    fn test_resolve_uses_final_register_content() {
        let coordinator = RoundCoordinator::new(Arc::new(AnswerRegister::new()), 1);
        assert!(coordinator.resolve(question(true)).replay());

        // An answer recorded at the last moment still wins
        coordinator
            .register()
            .try_record_if_correct(true, "Jordan", true);

        let outcome = coordinator.resolve(question(true));
        assert_eq!(outcome.winner(), Some("Jordan"));
        assert!(!outcome.replay());
    }

    #[tokio::test]
    async fn test_empty_roster_expires_immediately() {
        struct Fixed;
        impl QuestionSource for Fixed {
            fn next_question(&mut self) -> QuestionRecord {
                question(true)
            }
        }

        let coordinator = RoundCoordinator::new(Arc::new(AnswerRegister::new()), 5);
        let mut roster = Roster::new();

        let outcome = timeout(
            Duration::from_secs(1),
            coordinator.play_round(&mut roster, &mut Fixed),
        )
        .await
        .unwrap();

        assert!(outcome.replay());
    }
}
