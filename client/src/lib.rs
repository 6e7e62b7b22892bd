//! # Trivia Client Library
//!
//! Thin counterpart to the trivia server. The client waits for a discovery
//! offer on the well-known UDP port, connects to the advertised TCP port,
//! introduces itself by name and then relays the game to the terminal.
//!
//! ## Session Flow
//!
//! 1. Listen for offers, skipping datagrams with a wrong magic cookie or
//!    message type
//! 2. Connect and send the display name
//! 3. Print the welcome roster and each question, forwarding typed answers
//! 4. On the `Expired` sentinel keep playing; on any other result, the game
//!    is over and the client goes back to step 1
//!
//! ## Module Organization
//!
//! - `discovery`: offer listener
//! - `input`: keyboard answer source
//! - `network`: connection handling and the game session
//! - `style`: terminal colors

pub mod discovery;
pub mod input;
pub mod network;
pub mod style;
