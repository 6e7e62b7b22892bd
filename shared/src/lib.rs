//! Wire protocol shared by the trivia server and client.
//!
//! Two channels are involved:
//! - a UDP discovery offer with a fixed 7-byte big-endian layout
//!   (`[magic cookie: u32][message type: u8][server port: u16]`)
//! - a plain-text TCP session carrying the player's name, the welcome
//!   roster, true/false prompts, single-character answers and round results

use bincode::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAGIC_COOKIE: u32 = 0xabcd_dcba;
pub const OFFER_MESSAGE_TYPE: u8 = 0x02;
pub const OFFER_SIZE: usize = 7;

pub const DEFAULT_SERVER_PORT: u16 = 4567;
pub const DEFAULT_DISCOVERY_PORT: u16 = 13117;

/// Status message telling clients that another round follows.
///
/// Clients compare against this exact text; anything else that arrives after
/// a question is the final result.
pub const EXPIRED_SENTINEL: &str = "Expired";

pub const PROMPT_PREFIX: &str = "True or false: ";

const TRUE_TOKENS: [&str; 3] = ["1", "t", "y"];
const FALSE_TOKENS: [&str; 3] = ["0", "f", "n"];

/// Errors raised while validating a discovery datagram
#[derive(Debug, Error)]
pub enum OfferError {
    #[error("malformed offer packet: {0}")]
    Malformed(#[from] bincode::Error),

    #[error("unexpected magic cookie {0:#010x}")]
    BadCookie(u32),

    #[error("unexpected message type {0:#04x}")]
    BadMessageType(u8),
}

/// Errors raised while normalizing an answer token
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerError {
    #[error("empty answer")]
    Empty,

    #[error("unrecognized answer {0:?}")]
    Unrecognized(String),
}

/// Discovery announcement broadcast by the server once per second
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Offer {
    pub magic_cookie: u32,
    pub message_type: u8,
    pub server_port: u16,
}

impl Offer {
    pub fn new(server_port: u16) -> Self {
        Self {
            magic_cookie: MAGIC_COOKIE,
            message_type: OFFER_MESSAGE_TYPE,
            server_port,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, OfferError> {
        Ok(wire_options().serialize(self)?)
    }

    /// Decodes a datagram and checks both protocol constants
    pub fn decode(bytes: &[u8]) -> Result<Self, OfferError> {
        let offer: Offer = wire_options().deserialize(bytes)?;

        if offer.magic_cookie != MAGIC_COOKIE {
            return Err(OfferError::BadCookie(offer.magic_cookie));
        }
        if offer.message_type != OFFER_MESSAGE_TYPE {
            return Err(OfferError::BadMessageType(offer.message_type));
        }

        Ok(offer)
    }
}

// Network byte order, no length prefixes, no trailing bytes.
fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Normalizes an answer token to a boolean.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn parse_answer(token: &str) -> Result<bool, AnswerError> {
    let token = token.trim().to_ascii_lowercase();

    if token.is_empty() {
        return Err(AnswerError::Empty);
    }
    if TRUE_TOKENS.contains(&token.as_str()) {
        return Ok(true);
    }
    if FALSE_TOKENS.contains(&token.as_str()) {
        return Ok(false);
    }

    Err(AnswerError::Unrecognized(token))
}

/// Builds the question prompt sent at the start of every round
pub fn format_prompt(question: &str) -> String {
    let text = question.trim().trim_end_matches(['.', '?']);
    format!("{}{}?\n", PROMPT_PREFIX, text)
}

/// One logical message recovered from a chunk of server output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Expired,
    Question(String),
    Text(String),
}

/// Splits a chunk read from the server into logical messages.
///
/// TCP may coalesce the sentinel with the next prompt, or the welcome with
/// the first prompt, so a single read can yield several messages.
pub fn parse_server_chunk(chunk: &str) -> Vec<ServerMessage> {
    let mut messages = Vec::new();
    let mut rest = chunk;

    while let Some(remainder) = rest.strip_prefix(EXPIRED_SENTINEL) {
        messages.push(ServerMessage::Expired);
        rest = remainder.trim_start_matches(['\r', '\n']);
    }

    let mut text = String::new();
    for line in rest.split_inclusive('\n') {
        if let Some(question) = line.strip_prefix(PROMPT_PREFIX) {
            flush_text(&mut text, &mut messages);
            let question = question.trim_end().trim_end_matches('?');
            messages.push(ServerMessage::Question(question.to_string()));
        } else if line.trim_end() == EXPIRED_SENTINEL {
            flush_text(&mut text, &mut messages);
            messages.push(ServerMessage::Expired);
        } else {
            text.push_str(line);
        }
    }
    flush_text(&mut text, &mut messages);

    messages
}

fn flush_text(text: &mut String, messages: &mut Vec<ServerMessage>) {
    if !text.trim().is_empty() {
        messages.push(ServerMessage::Text(text.trim_end().to_string()));
    }
    text.clear();
}
