//! Tunable settings for recruitment, rounds and the discovery beacon

use shared::{DEFAULT_DISCOVERY_PORT, DEFAULT_SERVER_PORT};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the TCP listener binds to
    pub host: IpAddr,
    /// TCP service port advertised in discovery offers (0 picks a free port)
    pub server_port: u16,
    /// UDP port clients listen on for offers
    pub discovery_port: u16,
    /// Destination address for discovery offers
    pub broadcast_addr: IpAddr,
    /// Time between discovery offers
    pub beacon_interval: Duration,
    /// Recruitment closes once this long passes without a new player
    pub quiet_period: Duration,
    /// Upper bound on a single accept attempt before the stop rule is re-checked
    pub accept_timeout: Duration,
    /// How long a new connection has to send its display name
    pub name_timeout: Duration,
    /// Answer window of a round, counted down in whole seconds
    pub answer_timeout: Duration,
    /// Pause between the end of a round set and the next recruitment
    pub round_set_pause: Duration,
}

impl ServerConfig {
    /// Length of the answer window in whole seconds, never below one
    pub fn answer_window_secs(&self) -> u64 {
        self.answer_timeout.as_secs().max(1)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            server_port: DEFAULT_SERVER_PORT,
            discovery_port: DEFAULT_DISCOVERY_PORT,
            broadcast_addr: IpAddr::V4(Ipv4Addr::BROADCAST),
            beacon_interval: Duration::from_secs(1),
            quiet_period: Duration::from_secs(10),
            accept_timeout: Duration::from_secs(1),
            name_timeout: Duration::from_secs(3),
            answer_timeout: Duration::from_secs(10),
            round_set_pause: Duration::from_secs(1),
        }
    }
}
