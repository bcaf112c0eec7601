//! Composition root: builds one transport-bound server and the matching set
//! of capability handles for the selected protocol, then manages its
//! lifecycle.
//!
//! Construction order is strict: configuration validation gates everything,
//! the sidecar client is built next (one capability needs it at construction
//! time), then the protocol builder instantiates the transport server and
//! capability set. Only after construction completes is `start` callable.

pub mod capabilities;
pub mod grpc;
pub mod http;
pub mod registry;
pub mod transport;

use crate::client::DaprClient;
use crate::config::{CommunicationProtocol, ServerConfig};
use crate::error::{BuildError, ServerError};
use capabilities::{CapabilitySet, ServerActor, ServerBinding, ServerInvoker, ServerPubSub};
use grpc::{GrpcCapabilityContext, GrpcServer, GrpcServerActor, GrpcServerBinding, GrpcServerInvoker, GrpcServerPubSub};
use http::{HttpCapabilityContext, HttpServer, HttpServerActor, HttpServerBinding, HttpServerInvoker, HttpServerPubSub};
use slog::{info, o, Drain, Logger};
use std::sync::Arc;
use tokio::sync::Mutex;
use transport::TransportServer;

/// Lifecycle of the constructed server. Restart after a stop is not offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Running,
    Stopped,
}

/// Facade over one transport-bound server and its four capability handles.
pub struct DaprServer {
    config: ServerConfig,
    client: Arc<DaprClient>,
    server: Arc<dyn TransportServer>,
    capabilities: CapabilitySet,
    state: Mutex<LifecycleState>,
    logger: Logger,
}

impl DaprServer {
    /// Construct a server for the configured protocol.
    ///
    /// Fails synchronously with a [`BuildError`] if the configuration is
    /// invalid or the sidecar client cannot be built; no partial server is
    /// ever returned.
    pub fn new(config: ServerConfig) -> Result<Self, BuildError> {
        Self::with_logger(config, default_logger())
    }

    /// Like [`DaprServer::new`], with a caller-provided root logger.
    pub fn with_logger(config: ServerConfig, logger: Logger) -> Result<Self, BuildError> {
        // Validation gates construction; also publishes the resolved ports
        config.validate()?;

        // The client must exist before the transport server is built because
        // the HTTP actor capability takes a reference at construction time
        let client = Arc::new(DaprClient::new(
            &config.dapr_host,
            &config.dapr_port,
            config.protocol,
            &config.client_options,
            logger.new(o!("component" => "client")),
        )?);

        let (server, capabilities) = build_for_protocol(config.protocol, &client, &logger);

        info!(logger, "Server constructed";
            "protocol" => config.protocol.as_str(),
            "server_port" => &config.server_port,
            "dapr_port" => &config.dapr_port
        );

        Ok(Self {
            config,
            client,
            server,
            capabilities,
            state: Mutex::new(LifecycleState::NotStarted),
            logger,
        })
    }

    /// Start serving on the configured host and port.
    ///
    /// Errors with [`ServerError::AlreadyRunning`] if called while running,
    /// and [`ServerError::AlreadyStopped`] after a stop; restart is not
    /// offered by this facade.
    pub async fn start(&self) -> Result<(), ServerError> {
        let mut state = self.state.lock().await;
        match *state {
            LifecycleState::NotStarted => {}
            LifecycleState::Running => return Err(ServerError::AlreadyRunning),
            LifecycleState::Stopped => return Err(ServerError::AlreadyStopped),
        }

        self.server
            .start(&self.config.server_host, &self.config.server_port)
            .await?;

        *state = LifecycleState::Running;
        info!(self.logger, "Server started";
            "host" => &self.config.server_host,
            "port" => &self.config.server_port
        );
        Ok(())
    }

    /// Gracefully stop serving. A no-op before `start`.
    pub async fn stop(&self) -> Result<(), ServerError> {
        let mut state = self.state.lock().await;
        if *state != LifecycleState::Running {
            return Ok(());
        }

        self.server.stop().await?;
        *state = LifecycleState::Stopped;
        info!(self.logger, "Server stopped");
        Ok(())
    }

    /// Hard teardown of the listener, distinct from [`DaprServer::stop`].
    /// A no-op before `start`.
    pub async fn stop_server(&self) -> Result<(), ServerError> {
        let mut state = self.state.lock().await;
        if *state != LifecycleState::Running {
            return Ok(());
        }

        self.server.stop_listener().await?;
        *state = LifecycleState::Stopped;
        info!(self.logger, "Server listener aborted");
        Ok(())
    }

    pub async fn lifecycle_state(&self) -> LifecycleState {
        *self.state.lock().await
    }

    /// The outbound sidecar client. The same instance is held by the HTTP
    /// actor capability.
    pub fn client(&self) -> Arc<DaprClient> {
        self.client.clone()
    }

    /// The concrete transport server behind this facade.
    pub fn underlying_server(&self) -> Arc<dyn TransportServer> {
        self.server.clone()
    }

    pub fn dapr_host(&self) -> &str {
        &self.config.dapr_host
    }

    pub fn dapr_port(&self) -> &str {
        &self.config.dapr_port
    }

    pub fn server_host(&self) -> &str {
        &self.config.server_host
    }

    pub fn server_port(&self) -> &str {
        &self.config.server_port
    }

    pub fn protocol(&self) -> CommunicationProtocol {
        self.config.protocol
    }

    pub fn pubsub(&self) -> Arc<dyn ServerPubSub> {
        self.capabilities.pubsub.clone()
    }

    pub fn binding(&self) -> Arc<dyn ServerBinding> {
        self.capabilities.binding.clone()
    }

    pub fn invoker(&self) -> Arc<dyn ServerInvoker> {
        self.capabilities.invoker.clone()
    }

    pub fn actor(&self) -> Arc<dyn ServerActor> {
        self.capabilities.actor.clone()
    }

    #[cfg(test)]
    fn from_parts(
        config: ServerConfig,
        client: Arc<DaprClient>,
        server: Arc<dyn TransportServer>,
        capabilities: CapabilitySet,
        logger: Logger,
    ) -> Self {
        Self {
            config,
            client,
            server,
            capabilities,
            state: Mutex::new(LifecycleState::NotStarted),
            logger,
        }
    }
}

/// Map a protocol to its transport server and capability set.
///
/// The mapping is total over the enumeration. Every capability builder
/// receives the same context carrying both the server and the client; only
/// the HTTP actor implementation retains the client.
fn build_for_protocol(
    protocol: CommunicationProtocol,
    client: &Arc<DaprClient>,
    logger: &Logger,
) -> (Arc<dyn TransportServer>, CapabilitySet) {
    match protocol {
        CommunicationProtocol::Grpc => {
            let server = Arc::new(GrpcServer::new(logger.new(o!("server" => "grpc"))));
            let context = GrpcCapabilityContext {
                server: server.clone(),
                client: client.clone(),
            };

            let capabilities = CapabilitySet {
                pubsub: Arc::new(GrpcServerPubSub::new(&context)),
                binding: Arc::new(GrpcServerBinding::new(&context)),
                invoker: Arc::new(GrpcServerInvoker::new(&context)),
                actor: Arc::new(GrpcServerActor::new(&context)),
            };

            (server, capabilities)
        }
        CommunicationProtocol::Http => {
            let server = Arc::new(HttpServer::new(logger.new(o!("server" => "http"))));
            let context = HttpCapabilityContext {
                server: server.clone(),
                client: client.clone(),
            };

            let capabilities = CapabilitySet {
                pubsub: Arc::new(HttpServerPubSub::new(&context)),
                binding: Arc::new(HttpServerBinding::new(&context)),
                invoker: Arc::new(HttpServerInvoker::new(&context)),
                actor: Arc::new(HttpServerActor::new(&context)),
            };

            (server, capabilities)
        }
    }
}

fn default_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!("app" => "daprside"))
}
