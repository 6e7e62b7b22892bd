//! TCP acceptance during the recruitment window

use crate::recruitment::AdmissionProgress;
use crate::session::{ClientSession, Roster, READ_BUFFER_SIZE};
use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};

/// Consecutive accept errors after which the listener is considered broken
const MAX_CONSECUTIVE_ACCEPT_FAILURES: u32 = 5;
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Accepts players until the quiet period passes with no new admission
pub struct ConnectionAdmitter {
    listener: TcpListener,
    accept_timeout: Duration,
    name_timeout: Duration,
}

impl ConnectionAdmitter {
    /// Binds the service port. Failure here is fatal for the server.
    pub async fn bind(
        addr: SocketAddr,
        accept_timeout: Duration,
        name_timeout: Duration,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            accept_timeout,
            name_timeout,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Admits players until recruitment closes and returns them in
    /// connection order.
    ///
    /// If the listener keeps failing, recruitment is closed early and
    /// whatever roster exists is returned, possibly empty.
    pub async fn run(&self, progress: &AdmissionProgress) -> Roster {
        let mut roster = Roster::new();
        let mut failures = 0;

        while !progress.is_closed() {
            let accepted = match timeout(self.accept_timeout, self.listener.accept()).await {
                // Nobody connected during this attempt; re-check the stop rule
                Err(_) => continue,
                Ok(result) => result,
            };

            match accepted {
                Ok((stream, addr)) => {
                    failures = 0;
                    if let Some(session) = self.admit(stream, addr).await {
                        let count = progress.record_admission();
                        info!(
                            "{} successfully connected from {} ({} players)",
                            session.name(),
                            addr,
                            count
                        );
                        roster.push(session);
                    }
                }
                Err(e) => {
                    failures += 1;
                    warn!("Unable to accept client connection: {}", e);

                    if failures >= MAX_CONSECUTIVE_ACCEPT_FAILURES {
                        error!(
                            "Listener failed {} times in a row, closing recruitment",
                            failures
                        );
                        progress.close();
                        break;
                    }
                    sleep(ACCEPT_RETRY_DELAY).await;
                }
            }
        }

        debug!("Recruitment closed with {} players", roster.len());
        roster
    }

    /// Waits for the display name; drops the connection if none arrives in time
    async fn admit(&self, mut stream: TcpStream, addr: SocketAddr) -> Option<ClientSession> {
        let mut buf = [0u8; READ_BUFFER_SIZE];

        match timeout(self.name_timeout, stream.read(&mut buf)).await {
            Err(_) => {
                warn!("Client {} did not send a name in time", addr);
                None
            }
            Ok(Ok(0)) => {
                warn!("Client {} disconnected before sending a name", addr);
                None
            }
            Ok(Ok(n)) => match parse_display_name(&buf[..n]) {
                Some(name) => Some(ClientSession::new(stream, name, addr)),
                None => {
                    warn!("Client {} sent an empty name", addr);
                    None
                }
            },
            Ok(Err(e)) => {
                warn!("Failed to read name from {}: {}", addr, e);
                None
            }
        }
    }
}

/// Takes the first line of the name message, without its line ending
fn parse_display_name(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let name = text.lines().next().unwrap_or("").trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
