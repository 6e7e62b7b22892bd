//! Trivia question supply with no repeats until the pool is exhausted

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// A true/false question and its correct answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub text: String,
    pub answer: bool,
}

impl QuestionRecord {
    pub fn new(text: impl Into<String>, answer: bool) -> Self {
        Self {
            text: text.into(),
            answer,
        }
    }
}

/// Supplier of questions for a running server
pub trait QuestionSource: Send {
    /// Draws the next question. Never repeats one until every question in
    /// the pool has been drawn, then starts over.
    fn next_question(&mut self) -> QuestionRecord;
}

const BUILTIN_QUESTIONS: &[(&str, bool)] = &[
    ("Cats can make over 100 different sounds, while dogs can only make about 10", true),
    ("A group of flamingos is called a 'flamboyance'", true),
    ("Bananas grow on trees", false),
    ("Venus is the hottest planet in our solar system", true),
    ("A duck's quack doesn't echo", false),
    ("Humans and dinosaurs coexisted at the same point in history", false),
    ("You can sneeze in your sleep", false),
    ("An octopus has three hearts", true),
    ("The Great Wall of China is visible from space with the naked eye", false),
    ("A group of crows is called a 'murder'", true),
    ("Cats can bark", false),
    ("Ducks have three eyelids", true),
    ("Bananas grow upside down", true),
    ("Humans can't breathe and swallow at the same time", true),
    ("Penguins can fly if they really try", false),
    ("A snail can sleep for three years", true),
    ("Some turtles can breathe through their butts", true),
    ("The moon is closer to Earth than Mars is", true),
    ("A cow-bison hybrid is called a 'Beefalo'", true),
    ("Sharks are immune to all known diseases", false),
    ("Goldfish only have a memory of three seconds", false),
    ("The Atlantic Ocean is the warmest ocean on Earth", false),
    ("A group of unicorns is called a 'blessing'", true),
    ("Rainbows can only form in the morning", false),
    ("Chocolate can be lethal to dogs", true),
];

/// Question pool drawn without replacement, reshuffled once exhausted
pub struct TriviaBank {
    pool: Vec<QuestionRecord>,
    available: Vec<usize>,
    rng: StdRng,
}

impl TriviaBank {
    /// Creates a bank over the given pool, seeded from OS entropy.
    ///
    /// The pool must not be empty; drawing from an empty bank panics.
    pub fn new(pool: Vec<QuestionRecord>) -> Self {
        Self::with_rng(pool, StdRng::from_entropy())
    }

    /// Creates a bank with a fixed seed so draws are reproducible
    pub fn with_seed(pool: Vec<QuestionRecord>, seed: u64) -> Self {
        Self::with_rng(pool, StdRng::seed_from_u64(seed))
    }

    fn with_rng(pool: Vec<QuestionRecord>, rng: StdRng) -> Self {
        let available = (0..pool.len()).collect();
        Self {
            pool,
            available,
            rng,
        }
    }

    pub fn builtin() -> Self {
        let pool = BUILTIN_QUESTIONS
            .iter()
            .map(|(text, answer)| QuestionRecord::new(*text, *answer))
            .collect();
        Self::new(pool)
    }

    /// Loads a question file.
    ///
    /// Each line is `T|question` or `F|question`. Blank lines and lines
    /// starting with `#` are skipped; malformed lines are logged and skipped.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let pool = parse_question_lines(reader)?;

        if pool.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("no valid questions in {}", path.display()),
            ));
        }

        info!("Loaded {} questions from {}", pool.len(), path.display());
        Ok(Self::new(pool))
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Number of questions left before the pool resets
    pub fn remaining(&self) -> usize {
        self.available.len()
    }
}

impl QuestionSource for TriviaBank {
    fn next_question(&mut self) -> QuestionRecord {
        if self.available.is_empty() {
            info!("All questions have been asked, resetting the pool");
            self.available = (0..self.pool.len()).collect();
        }

        let pick = self.rng.gen_range(0..self.available.len());
        let index = self.available.swap_remove(pick);
        self.pool[index].clone()
    }
}

fn parse_question_lines(reader: impl BufRead) -> io::Result<Vec<QuestionRecord>> {
    let mut pool = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parsed = line.split_once('|').and_then(|(answer, text)| {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            match answer.trim().to_ascii_uppercase().as_str() {
                "T" => Some(QuestionRecord::new(text, true)),
                "F" => Some(QuestionRecord::new(text, false)),
                _ => None,
            }
        });

        match parsed {
            Some(record) => pool.push(record),
            None => warn!("Skipping malformed question line: {:?}", line),
        }
    }

    Ok(pool)
}
