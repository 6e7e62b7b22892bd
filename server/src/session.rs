//! Per-player connection state and the ordered roster of a round set
//!
//! A session owns its TCP stream while it is active. Deactivating a session
//! drops the stream but keeps the entry in the roster so display numbering
//! stays stable until the round set ends.

use log::{debug, info, warn};
use std::io;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Scratch size for draining stray bytes and reading answers
pub const READ_BUFFER_SIZE: usize = 1024;

#[derive(Debug)]
pub struct ClientSession {
    stream: Option<TcpStream>,
    name: String,
    addr: SocketAddr,
}

impl ClientSession {
    pub fn new(stream: TcpStream, name: String, addr: SocketAddr) -> Self {
        Self {
            stream: Some(stream),
            name,
            addr,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Closes the connection and excludes the session from further I/O
    pub fn deactivate(&mut self) {
        if self.stream.take().is_some() {
            info!("Player {} ({}) is no longer active", self.name, self.addr);
        }
    }

    /// Hands the stream to an answer collector for the duration of a round
    pub fn take_stream(&mut self) -> Option<TcpStream> {
        self.stream.take()
    }

    /// Returns a stream taken by `take_stream`
    pub fn restore_stream(&mut self, stream: TcpStream) {
        self.stream = Some(stream);
    }

    /// Sends a message, deactivating the session on failure.
    ///
    /// Returns false if the session was inactive or the write failed.
    pub async fn send(&mut self, message: &str) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };

        match stream.write_all(message.as_bytes()).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send to {} ({}): {}", self.name, self.addr, e);
                self.deactivate();
                false
            }
        }
    }

    /// Discards bytes already buffered on the connection without waiting
    pub fn discard_pending(&mut self) {
        let Some(stream) = self.stream.as_ref() else {
            return;
        };

        match discard_buffered(stream) {
            Ok(0) => {}
            Ok(n) => debug!("Discarded {} stray bytes from {}", n, self.name),
            Err(e) => {
                warn!("Connection to {} ({}) failed: {}", self.name, self.addr, e);
                self.deactivate();
            }
        }
    }

    /// Ends the connection cleanly.
    ///
    /// Unread input is drained first: closing a socket that still holds
    /// unread bytes resets the connection and the peer can lose the last
    /// message it was sent.
    pub async fn close(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };

        if let Err(e) = discard_buffered(&stream) {
            debug!("Connection to {} already closed: {}", self.name, e);
            return;
        }
        if let Err(e) = stream.shutdown().await {
            debug!("Failed to shut down connection to {}: {}", self.name, e);
        }
    }
}

/// Reads and drops everything currently readable on the stream.
///
/// Returns the number of bytes discarded, or an error if the peer has
/// closed or reset the connection.
pub fn discard_buffered(stream: &TcpStream) -> io::Result<usize> {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut discarded = 0;

    loop {
        match stream.try_read(&mut buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by peer",
                ))
            }
            Ok(n) => discarded += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(discarded),
            Err(e) => return Err(e),
        }
    }
}

/// Players admitted for the current round set, in connection order
#[derive(Debug, Default)]
pub struct Roster {
    sessions: Vec<ClientSession>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, session: ClientSession) {
        self.sessions.push(session);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ClientSession> {
        self.sessions.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ClientSession> {
        self.sessions.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientSession> {
        self.sessions.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ClientSession> {
        self.sessions.iter_mut()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_active()).count()
    }

    pub fn has_active(&self) -> bool {
        self.sessions.iter().any(|s| s.is_active())
    }

    /// Sends a message to every active session. Returns how many succeeded.
    pub async fn broadcast(&mut self, message: &str) -> usize {
        let mut delivered = 0;
        for session in self.sessions.iter_mut() {
            if session.send(message).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Welcome text naming every admitted player
    pub fn welcome_message(&self) -> String {
        let mut message =
            String::from("Welcome to the Mystic server, where you answer trivia questions.\n");
        for (i, session) in self.sessions.iter().enumerate() {
            message.push_str(&format!("Player {}: {}\n", i + 1, session.name()));
        }
        message.push_str("==\n");
        message
    }

    /// Closes every open connection and empties the roster
    pub async fn close_all(&mut self) {
        for session in self.sessions.iter_mut() {
            session.close().await;
        }
        self.sessions.clear();
    }
}
