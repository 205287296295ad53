//! Runtime orchestration.
//!
//! [`BridgeRuntime`] owns the explicitly-constructed context everything else
//! borrows from: the frozen handler registry inside the dispatch engine, the
//! command adapter over the host API, and the two bridge transports. It
//! wires the event channel between engine and bridge, starts the servers and
//! tears them down on shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};

use braze_bridge::{BridgeHandle, ProtocolBridge, SyncGateway, SyncHandle};
use braze_core::{DispatchEngine, Event, HandlerRegistry};
use braze_host::{BoxedHostApi, CommandAdapter};

use crate::boundary::CallbackGateway;
use crate::config::BrazeConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Depth of the engine → bridge event channel.
const EVENT_QUEUE: usize = 256;

/// The braze orchestrator.
///
/// Construction freezes the handler registry and builds the engine; `start`
/// brings up the transports. The host integration layer drives events in
/// through [`callback_gateway`](Self::callback_gateway).
pub struct BridgeRuntime {
    config: BrazeConfig,
    adapter: Arc<CommandAdapter>,
    engine: Arc<DispatchEngine>,
    /// Consumed by `start`.
    events_rx: Option<mpsc::Receiver<Event>>,
    bridge: Option<BridgeHandle>,
    sync: Option<SyncHandle>,
}

impl BridgeRuntime {
    /// Creates a runtime from configuration, a host handle and the
    /// registrations collected during the startup pass.
    ///
    /// Also initializes logging from the configuration.
    pub fn new(config: BrazeConfig, host: BoxedHostApi, registry: HandlerRegistry) -> Self {
        logging::init_from_config(&config.logging);

        let adapter = Arc::new(CommandAdapter::new(host));
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
        let engine = Arc::new(DispatchEngine::new(Arc::new(registry)).with_sink(events_tx));

        info!(
            handlers = engine.registry().len(),
            "runtime initialized"
        );

        Self {
            config,
            adapter,
            engine,
            events_rx: Some(events_rx),
            bridge: None,
            sync: None,
        }
    }

    /// The callback surface for the host integration layer.
    pub fn callback_gateway(&self) -> CallbackGateway {
        CallbackGateway::new(Arc::clone(&self.engine))
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &BrazeConfig {
        &self.config
    }

    /// The running WebSocket bridge handle, once started.
    pub fn bridge(&self) -> Option<&BridgeHandle> {
        self.bridge.as_ref()
    }

    /// The bound address of the WebSocket bridge, once started.
    pub fn bridge_addr(&self) -> Option<SocketAddr> {
        self.bridge.as_ref().map(BridgeHandle::local_addr)
    }

    /// The bound address of the sync gateway, once started.
    pub fn sync_addr(&self) -> Option<SocketAddr> {
        self.sync.as_ref().map(SyncHandle::local_addr)
    }

    /// Starts the WebSocket bridge and, when enabled, the sync gateway.
    pub async fn start(&mut self) -> RuntimeResult<()> {
        let events_rx = self.events_rx.take().ok_or(RuntimeError::AlreadyStarted)?;

        let bridge = ProtocolBridge::new(
            self.config.bridge.to_bridge_config(),
            Arc::clone(&self.adapter),
        )
        .start(events_rx)
        .await?;
        self.bridge = Some(bridge);

        if self.config.sync.enabled {
            let gateway = SyncGateway::new(
                self.config.sync.to_gateway_config(),
                Arc::clone(&self.adapter),
            )
            .start()
            .await?;
            self.sync = Some(gateway);
        }

        Ok(())
    }

    /// Runs until ctrl-c, then shuts the transports down.
    ///
    /// Starts the transports first if [`start`](Self::start) has not been
    /// called yet.
    pub async fn run_until_shutdown(&mut self) -> RuntimeResult<()> {
        if self.bridge.is_none() {
            self.start().await?;
        }

        info!("braze running, waiting for shutdown signal");
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
        }

        self.shutdown();
        Ok(())
    }

    /// Stops both transports. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(bridge) = self.bridge.take() {
            bridge.shutdown();
        }
        if let Some(sync) = self.sync.take() {
            sync.shutdown();
        }
        info!("braze stopped");
    }
}

impl std::fmt::Debug for BridgeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeRuntime")
            .field("started", &self.bridge.is_some())
            .finish_non_exhaustive()
    }
}
