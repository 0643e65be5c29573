//! TCP connect probing
//!
//! A probe makes exactly one connection attempt bounded by a wall-clock
//! timeout. Every failure mode maps to [`PortState::Closed`]; the socket is
//! released on all paths before the probe returns.

use crate::network::PortState;
use async_trait::async_trait;
use log::{debug, warn};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::net::{TcpSocket, TcpStream};

/// Strategy for deciding whether a single port is open.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe one port. Must not fail: problems are reported as `Closed`.
    async fn probe(&self, addr: Ipv4Addr, port: u16) -> PortState;
}

/// Full-handshake connect prober, no privileges required
#[derive(Debug, Clone)]
pub struct TcpConnectProber {
    timeout: Duration,
}

impl TcpConnectProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn connect(addr: SocketAddr) -> io::Result<TcpStream> {
        let socket = TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.connect(addr).await
    }
}

#[async_trait]
impl Prober for TcpConnectProber {
    async fn probe(&self, addr: Ipv4Addr, port: u16) -> PortState {
        let target = SocketAddr::V4(SocketAddrV4::new(addr, port));

        match tokio::time::timeout(self.timeout, Self::connect(target)).await {
            Ok(Ok(stream)) => {
                debug!("{} open", target);
                drop(stream);
                PortState::Open
            }
            Ok(Err(e)) => {
                if is_fd_exhaustion(&e) {
                    warn!("{}: {} (consider fewer workers or a higher --ulimit)", target, e);
                } else {
                    debug!("{} closed: {}", target, e);
                }
                PortState::Closed
            }
            Err(_elapsed) => {
                debug!("{} closed: timed out after {:?}", target, self.timeout);
                PortState::Closed
            }
        }
    }
}

fn is_fd_exhaustion(e: &io::Error) -> bool {
    e.to_string().to_lowercase().contains("too many open files")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[tokio::test]
    async fn listening_port_is_open() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let prober = TcpConnectProber::new(Duration::from_secs(1));
        assert_eq!(prober.probe(Ipv4Addr::LOCALHOST, port).await, PortState::Open);
    }

    #[tokio::test]
    async fn port_without_listener_is_closed() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let prober = TcpConnectProber::new(Duration::from_millis(1));
        assert_eq!(prober.probe(Ipv4Addr::LOCALHOST, port).await, PortState::Closed);
    }

    #[tokio::test]
    async fn zero_timeout_never_panics() {
        let prober = TcpConnectProber::new(Duration::ZERO);
        // Documentation range, nothing should answer.
        let state = prober.probe(Ipv4Addr::new(192, 0, 2, 1), 80).await;
        assert_eq!(state, PortState::Closed);
    }
}
