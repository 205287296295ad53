//! The synchronous request/reply gateway.
//!
//! A second, independent transport for request/reply only: no publishing, no
//! authentication, no concept of connections. The worker binds once and then
//! serves strictly sequentially — one newline-terminated frame in, exactly
//! one reply line out, one outstanding request at a time. Peers queue behind
//! each other at the accept call.
//!
//! A frame that yields no result (malformed, unknown action, missing
//! parameters) is still answered, with an empty line, so the one-reply-per-
//! request contract holds. Faults inside a cycle are logged and the worker
//! moves on; only failing to bind is fatal.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use braze_host::CommandAdapter;

use crate::error::{BridgeError, BridgeResult};
use crate::wire::CommandRequest;

/// Synchronous gateway configuration.
#[derive(Debug, Clone)]
pub struct SyncGatewayConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for SyncGatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6701,
        }
    }
}

impl SyncGatewayConfig {
    /// The socket address to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Handle to a running sync gateway.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    local_addr: SocketAddr,
    cancel: CancellationToken,
}

impl SyncHandle {
    /// The address the gateway actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the worker loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// The half-duplex request/reply worker.
pub struct SyncGateway {
    config: SyncGatewayConfig,
    adapter: Arc<CommandAdapter>,
}

impl SyncGateway {
    /// Creates a gateway over the given command adapter.
    pub fn new(config: SyncGatewayConfig, adapter: Arc<CommandAdapter>) -> Self {
        Self { config, adapter }
    }

    /// Binds the listener and spawns the worker loop.
    pub async fn start(self) -> BridgeResult<SyncHandle> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| BridgeError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "sync gateway listening");

        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();
        tokio::spawn(run_worker(listener, self.adapter, worker_cancel));

        Ok(SyncHandle { local_addr, cancel })
    }
}

/// Accepts and serves peers one at a time, forever.
async fn run_worker(
    listener: TcpListener,
    adapter: Arc<CommandAdapter>,
    cancel: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = cancel.cancelled() => break,
        };
        let (stream, remote) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "sync gateway accept failed");
                continue;
            }
        };

        trace!(remote_addr = %remote, "sync peer connected");
        // Served inline: the next peer is not accepted until this one is done.
        if let Err(e) = serve_peer(stream, &adapter, &cancel).await {
            debug!(remote_addr = %remote, error = %e, "sync peer dropped");
        }
    }
    debug!("sync gateway stopped");
}

/// Reads frames from one peer in lockstep, one reply line per frame.
async fn serve_peer(
    stream: TcpStream,
    adapter: &CommandAdapter,
    cancel: &CancellationToken,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = cancel.cancelled() => return Ok(()),
        };
        let Some(line) = line else {
            return Ok(());
        };

        let reply = CommandRequest::parse(&line)
            .and_then(|request| adapter.execute(&request.action, &request.params))
            .map(|value| value.to_string())
            .unwrap_or_default();

        write_half.write_all(reply.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
        write_half.flush().await?;
    }
}
