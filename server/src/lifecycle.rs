//! Top-level server loop: recruit, play rounds, reset, repeat

use crate::admission::ConnectionAdmitter;
use crate::config::ServerConfig;
use crate::discovery::DiscoveryBroadcaster;
use crate::questions::QuestionSource;
use crate::recruitment::AdmissionProgress;
use crate::register::AnswerRegister;
use crate::round::{RoundCoordinator, RoundOutcome};
use crate::session::Roster;
use log::{error, info, warn};
use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::Arc;
use tokio::time::sleep;

/// Result of one recruitment plus the rounds played with that roster
#[derive(Debug, Clone)]
pub struct RoundSetSummary {
    pub players: usize,
    pub rounds: usize,
    pub last_outcome: Option<RoundOutcome>,
}

pub struct ServerLifecycle {
    config: ServerConfig,
    broadcaster: Arc<DiscoveryBroadcaster>,
    admitter: ConnectionAdmitter,
    coordinator: RoundCoordinator,
    register: Arc<AnswerRegister>,
    questions: Box<dyn QuestionSource>,
}

impl ServerLifecycle {
    /// Binds the TCP service port and the discovery socket.
    ///
    /// This is the only fallible step: once bound, the server never stops
    /// on its own.
    pub async fn bind(
        config: ServerConfig,
        questions: Box<dyn QuestionSource>,
    ) -> io::Result<Self> {
        let admitter = ConnectionAdmitter::bind(
            SocketAddr::new(config.host, config.server_port),
            config.accept_timeout,
            config.name_timeout,
        )
        .await?;
        let service_addr = admitter.local_addr()?;

        let broadcaster = DiscoveryBroadcaster::bind(
            SocketAddr::new(config.broadcast_addr, config.discovery_port),
            service_addr.port(),
            config.beacon_interval,
        )
        .await?;

        match local_ip() {
            Ok(ip) => info!("Listening on IP address {} port {}", ip, service_addr.port()),
            Err(e) => warn!(
                "Could not determine LAN address ({}), bound to {}",
                e, service_addr
            ),
        }

        let register = Arc::new(AnswerRegister::new());
        let coordinator =
            RoundCoordinator::new(Arc::clone(&register), config.answer_window_secs());

        Ok(Self {
            config,
            broadcaster: Arc::new(broadcaster),
            admitter,
            coordinator,
            register,
            questions,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.admitter.local_addr()
    }

    /// Runs round sets forever
    pub async fn run(&mut self) {
        info!("Server started successfully!");

        loop {
            let summary = self.run_round_set().await;
            info!(
                "Round set finished: {} players, {} rounds, winner: {}",
                summary.players,
                summary.rounds,
                summary
                    .last_outcome
                    .as_ref()
                    .and_then(|o| o.winner())
                    .unwrap_or("none")
            );
            sleep(self.config.round_set_pause).await;
        }
    }

    /// Recruits a roster, plays until a winner emerges or no active player
    /// is left, then resets all per-round-set state.
    pub async fn run_round_set(&mut self) -> RoundSetSummary {
        let mut roster = Self::recruit(&self.config, &self.broadcaster, &self.admitter).await;
        let players = roster.len();
        info!("Recruitment closed with {} players", players);

        let welcome = roster.welcome_message();
        roster.broadcast(&welcome).await;

        let mut rounds = 0;
        let mut last_outcome = None;
        let mut replay = true;

        while replay && roster.has_active() {
            let outcome = self
                .coordinator
                .play_round(&mut roster, self.questions.as_mut())
                .await;
            rounds += 1;
            replay = outcome.replay();
            last_outcome = Some(outcome);
        }

        roster.close_all().await;
        self.register.reset();

        RoundSetSummary {
            players,
            rounds,
            last_outcome,
        }
    }

    /// Runs discovery and admission side by side until both are done
    async fn recruit(
        config: &ServerConfig,
        broadcaster: &Arc<DiscoveryBroadcaster>,
        admitter: &ConnectionAdmitter,
    ) -> Roster {
        let progress = Arc::new(AdmissionProgress::new(config.quiet_period));

        let beacon = {
            let broadcaster = Arc::clone(broadcaster);
            let progress = Arc::clone(&progress);
            tokio::spawn(async move { broadcaster.run(&progress).await })
        };

        let roster = admitter.run(&progress).await;

        // Stop the beacon even if admission ended early
        progress.close();
        if let Err(e) = beacon.await {
            error!("Discovery task failed: {}", e);
        }

        roster
    }
}

/// Address of the interface that routes to the wider network.
///
/// Connecting a UDP socket only selects a route; nothing is sent.
pub fn local_ip() -> io::Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:80")?;
    Ok(socket.local_addr()?.ip())
}
