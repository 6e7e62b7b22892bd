//! Answer input from the keyboard
//!
//! Reads lines and turns each into a single answer token. Lines that do not
//! normalize to true or false are rejected locally so they never reach the
//! server.

use log::debug;
use shared::parse_answer;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct AnswerInput<R> {
    lines: Lines<R>,
}

impl AnswerInput<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> AnswerInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Next valid answer token, or `None` once input is closed.
    ///
    /// Cancel safe, so it can be raced against server reads.
    pub async fn next_answer(&mut self) -> io::Result<Option<String>> {
        while let Some(line) = self.lines.next_line().await? {
            match answer_token(&line) {
                Some(token) => return Ok(Some(token)),
                None => {
                    debug!("Ignoring input {:?}", line);
                    println!("Answer with one of 1/t/y for true or 0/f/n for false");
                }
            }
        }
        Ok(None)
    }
}

/// The single-character token to send for a typed line
pub fn answer_token(line: &str) -> Option<String> {
    let token = line.trim();
    parse_answer(token).ok().map(|_| token.to_string())
}
