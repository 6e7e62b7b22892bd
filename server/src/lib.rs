//! # Trivia Server Library
//!
//! Authoritative server for a LAN true/false trivia game. The server
//! announces itself over UDP, recruits players over TCP for as long as new
//! players keep arriving, then asks questions until someone answers one
//! correctly first.
//!
//! ## Round Set Lifecycle
//!
//! ### Recruitment
//! Discovery and admission run side by side. The discovery beacon sends an
//! offer datagram every second; the admitter accepts connections and reads
//! each player's display name. Both stop once at least one player has joined
//! and the quiet period passes without another one.
//!
//! ### Rounds
//! Every round draws a question, sends the prompt to each active player and
//! starts one answer collector per player. Collectors race through a single
//! answer register where only the first *correct* answer is kept. A round
//! with a winner ends the round set; a round without one sends the `Expired`
//! sentinel and another round follows.
//!
//! ### Reset
//! When the round set ends every connection is drained of unread input and
//! shut down, the roster is emptied, and recruitment starts over.
//!
//! ## Failure Handling
//!
//! Per-player I/O failures deactivate only that player's session; the
//! session keeps its place in the roster so numbering stays stable. Only
//! failing to bind the service port stops the server.
//!
//! ## Module Organization
//!
//! - `config`: timeouts, ports and addresses
//! - `questions`: question source trait and the built-in trivia bank
//! - `register`: first-correct-answer slot and the shared round deadline
//! - `session`: per-player connection state and the roster
//! - `recruitment`: stop rule shared by discovery and admission
//! - `discovery`: UDP offer broadcaster
//! - `admission`: TCP connection admitter
//! - `round`: the round state machine
//! - `lifecycle`: the top-level server loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::lifecycle::ServerLifecycle;
//! use server::questions::TriviaBank;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server =
//!         ServerLifecycle::bind(ServerConfig::default(), Box::new(TriviaBank::builtin())).await?;
//!
//!     // Recruits players and plays round sets forever
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod admission;
pub mod config;
pub mod discovery;
pub mod lifecycle;
pub mod questions;
pub mod recruitment;
pub mod register;
pub mod round;
pub mod session;
