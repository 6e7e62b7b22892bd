//! Listens for server offers on the discovery port

use log::{info, warn};
use shared::Offer;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// Binds a fresh listener, waits for one valid offer and closes the socket.
///
/// Offers that arrive while a game is running are never seen, so the next
/// search only hears servers that are still recruiting.
pub async fn discover(addr: SocketAddr) -> io::Result<SocketAddr> {
    let listener = OfferListener::bind(addr).await?;
    listener.wait_for_offer().await
}

pub struct OfferListener {
    socket: UdpSocket,
}

impl OfferListener {
    /// Binds with address reuse so several clients on one host can share
    /// the discovery port.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
        socket.set_reuse_port(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;

        let socket = UdpSocket::from_std(socket.into())?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Waits for the first valid offer and returns the game server's address.
    ///
    /// Datagrams with the wrong layout, cookie or message type are logged
    /// and ignored.
    pub async fn wait_for_offer(&self) -> io::Result<SocketAddr> {
        let mut buf = [0u8; 1024];

        loop {
            let (len, src) = self.socket.recv_from(&mut buf).await?;

            match Offer::decode(&buf[..len]) {
                Ok(offer) => {
                    let server = SocketAddr::new(src.ip(), offer.server_port);
                    info!("Received offer from {}", server);
                    return Ok(server);
                }
                Err(e) => warn!("Ignoring packet from {}: {}", src, e),
            }
        }
    }
}
