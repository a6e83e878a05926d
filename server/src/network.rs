//! Server network layer: TCP game listener, UDP probe and background tasks

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::lobby::Lobby;
use crate::probe::ProbeResponder;
use crate::relay::serve_connection;
use log::{error, info};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// Pause after a failed accept, so a full descriptor table is not spun on
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Source of incoming connections for [`accept_loop`]
pub(crate) trait Acceptor {
    type Stream;

    async fn accept(&self) -> io::Result<(Self::Stream, SocketAddr)>;
}

impl Acceptor for TcpListener {
    type Stream = TcpStream;

    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

/// Hands every accepted connection to `on_connection`. Accept errors are
/// logged and retried after a short pause; they never end the loop.
pub(crate) async fn accept_loop<A, F>(acceptor: A, mut on_connection: F)
where
    A: Acceptor,
    F: FnMut(A::Stream, SocketAddr),
{
    loop {
        match acceptor.accept().await {
            Ok((stream, addr)) => on_connection(stream, addr),
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}

/// Main server owning both listeners and the shared lobby
pub struct Server {
    listener: TcpListener,
    probe: ProbeResponder,
    lobby: Arc<Lobby>,
}

impl Server {
    /// Binds both sockets and prepares the catalog and booster inventory
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let game_addr = config.game_addr();
        let listener = TcpListener::bind(&game_addr)
            .await
            .map_err(|e| ServerError::bind(&game_addr, e))?;
        info!("Server listening on {}", listener.local_addr()?);

        let probe = ProbeResponder::bind(&config.probe_addr()).await?;

        Ok(Server {
            listener,
            probe,
            lobby: Arc::new(Lobby::new(config)),
        })
    }

    /// Address of the TCP game listener
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Address of the UDP latency responder
    pub fn probe_addr(&self) -> Result<SocketAddr, ServerError> {
        self.probe.local_addr()
    }

    /// Shared lobby, for inspecting server state
    pub fn lobby(&self) -> Arc<Lobby> {
        Arc::clone(&self.lobby)
    }

    /// Starts the probe responder and the pairing loop, then accepts
    /// connections for as long as the process runs
    pub async fn run(self) -> Result<(), ServerError> {
        let probe_addr = self.probe.local_addr()?;
        tokio::spawn(self.probe.run());
        tokio::spawn(Arc::clone(&self.lobby).run_pairing_loop());

        let lobby = self.lobby;
        accept_loop(self.listener, move |stream: TcpStream, addr| {
            info!("Accepted connection from {}", addr);
            if let Err(e) = stream.set_nodelay(true) {
                error!("Failed to set TCP_NODELAY for {}: {}", addr, e);
            }
            tokio::spawn(serve_connection(stream, Arc::clone(&lobby), Some(probe_addr)));
        })
        .await;

        Ok(())
    }
}
