//! UDP latency probe responder
//!
//! Answers every `ping` datagram with `pong` to the sender. Anything else is
//! ignored, and no state is kept between datagrams.

use crate::error::ServerError;
use log::{error, info, warn};
use shared::{is_ping, PONG};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

pub struct ProbeResponder {
    socket: UdpSocket,
}

impl ProbeResponder {
    /// Binds the UDP socket; failure here is fatal at startup
    pub async fn bind(addr: &str) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| ServerError::bind(addr, e))?;
        info!("Latency probe listening on {}", socket.local_addr()?);
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    /// Answers datagrams until the task is dropped. Receive errors are
    /// logged and retried.
    pub async fn run(self) {
        let mut buffer = [0u8; 64];

        loop {
            match self.socket.recv_from(&mut buffer).await {
                Ok((len, addr)) => {
                    if !is_ping(&buffer[..len]) {
                        warn!("Ignoring {} byte probe datagram from {}", len, addr);
                        continue;
                    }
                    if let Err(e) = self.socket.send_to(PONG.as_bytes(), addr).await {
                        error!("Failed to answer probe from {}: {}", addr, e);
                    }
                }
                Err(e) => {
                    error!("Error receiving probe datagram: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    async fn start() -> SocketAddr {
        let responder = assert_ok!(ProbeResponder::bind("127.0.0.1:0").await);
        let addr = assert_ok!(responder.local_addr());
        tokio::spawn(responder.run());
        addr
    }

    #[tokio::test]
    async fn test_ping_gets_pong() {
        let addr = start().await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        socket.send_to(b"ping", addr).await.unwrap();
        let mut buffer = [0u8; 16];
        let (len, from) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buffer))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(&buffer[..len], b"pong");
        assert_eq!(from, addr);
    }

    #[tokio::test]
    async fn test_other_payloads_are_ignored() {
        let addr = start().await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        socket.send_to(b"hello", addr).await.unwrap();
        let mut buffer = [0u8; 16];
        let reply =
            tokio::time::timeout(Duration::from_millis(100), socket.recv_from(&mut buffer)).await;
        assert!(reply.is_err());

        // still serving afterwards
        socket.send_to(b"ping", addr).await.unwrap();
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buffer))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buffer[..len], b"pong");
    }

    #[tokio::test]
    async fn test_padded_ping_gets_no_reply() {
        let addr = start().await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        socket.send_to(b" ping \n", addr).await.unwrap();
        let mut buffer = [0u8; 16];
        let reply =
            tokio::time::timeout(Duration::from_millis(100), socket.recv_from(&mut buffer)).await;
        assert!(reply.is_err());
    }
}
