//! UDP discovery beacon announcing the server during recruitment

use crate::recruitment::AdmissionProgress;
use log::{debug, info, warn};
use shared::Offer;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, MissedTickBehavior};

/// Broadcasts offer datagrams once per interval until recruitment closes
pub struct DiscoveryBroadcaster {
    socket: UdpSocket,
    target: SocketAddr,
    payload: Vec<u8>,
    interval: Duration,
}

impl DiscoveryBroadcaster {
    /// Binds the beacon socket. `server_port` is the TCP port to advertise.
    pub async fn bind(
        target: SocketAddr,
        server_port: u16,
        interval: Duration,
    ) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.set_broadcast(true)?;
        let payload = Offer::new(server_port)
            .encode()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        Ok(Self {
            socket,
            target,
            payload,
            interval,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Runs until the recruitment window closes. Returns the number of
    /// offers that were sent successfully.
    pub async fn run(&self, progress: &AdmissionProgress) -> usize {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Broadcasting offers to {}", self.target);
        let mut sent = 0;

        loop {
            ticker.tick().await;

            if progress.is_closed() {
                break;
            }

            match self.socket.send_to(&self.payload, self.target).await {
                Ok(_) => sent += 1,
                // Best effort: try again on the next tick
                Err(e) => warn!("Failed to send offer to {}: {}", self.target, e),
            }
        }

        debug!("Discovery stopped after {} offers", sent);
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_broadcasts_valid_offers() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap();

        let broadcaster = DiscoveryBroadcaster::bind(target, 4567, Duration::from_millis(20))
            .await
            .unwrap();
        let progress = AdmissionProgress::new(Duration::from_secs(10));

        let mut buf = [0u8; 64];
        let run = broadcaster.run(&progress);
        tokio::pin!(run);

        let received = tokio::select! {
            _ = &mut run => panic!("Broadcaster stopped with no players"),
            result = listener.recv_from(&mut buf) => result.unwrap().0,
        };

        let offer = tokio_test::assert_ok!(Offer::decode(&buf[..received]));
        assert_eq!(offer.server_port, 4567);
    }

    #[tokio::test]
    async fn test_stops_once_recruitment_closes() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap();

        let broadcaster = DiscoveryBroadcaster::bind(target, 4567, Duration::from_millis(20))
            .await
            .unwrap();
        let progress = AdmissionProgress::new(Duration::from_millis(50));
        progress.record_admission();

        let sent = timeout(Duration::from_secs(2), broadcaster.run(&progress))
            .await
            .expect("broadcaster should stop after the quiet period");

        assert!(sent >= 1);
    }

    #[tokio::test]
    async fn test_keeps_running_without_players() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap();

        let broadcaster = DiscoveryBroadcaster::bind(target, 4567, Duration::from_millis(10))
            .await
            .unwrap();
        let progress = AdmissionProgress::new(Duration::from_millis(10));

        let result = timeout(Duration::from_millis(200), broadcaster.run(&progress)).await;
        assert!(result.is_err(), "broadcaster must not stop with zero players");
    }
}
