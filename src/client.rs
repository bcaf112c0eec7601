//! Outbound client for talking back into the sidecar.
//!
//! Exactly one client is constructed per server, before the transport server,
//! because the HTTP actor capability needs a reference to it at construction
//! time. The client is shared between the facade's accessor and that one
//! capability; both hold the same `Arc`.

use crate::config::{ClientOptions, CommunicationProtocol};
use slog::{debug, Logger};
use std::fmt;
use std::time::Duration;

/// Errors raised by the outbound sidecar client.
#[derive(Clone, Debug)]
pub enum ClientError {
    /// The underlying protocol client could not be constructed
    Build(String),
    /// The sidecar could not be reached
    Connection(String),
    /// The sidecar answered with an unexpected HTTP status
    UnexpectedStatus(u16),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Build(reason) => write!(f, "Failed to build sidecar client: {}", reason),
            ClientError::Connection(reason) => {
                write!(f, "Failed to reach sidecar: {}", reason)
            }
            ClientError::UnexpectedStatus(status) => {
                write!(f, "Sidecar returned unexpected status {}", status)
            }
        }
    }
}

impl std::error::Error for ClientError {}

enum ClientTransport {
    /// REST client, connection pool controlled by the keep-alive option
    Http(reqwest::Client),
    /// Lazily-connected gRPC endpoint
    Grpc(tonic::transport::Endpoint),
}

/// Outbound client bound to one sidecar address and protocol.
pub struct DaprClient {
    host: String,
    port: String,
    protocol: CommunicationProtocol,
    transport: ClientTransport,
    logger: Logger,
}

impl DaprClient {
    /// Construct a client for the given sidecar address.
    ///
    /// `options.is_keep_alive` controls connection reuse for both protocols.
    pub fn new(
        host: &str,
        port: &str,
        protocol: CommunicationProtocol,
        options: &ClientOptions,
        logger: Logger,
    ) -> Result<Self, ClientError> {
        let transport = match protocol {
            CommunicationProtocol::Grpc => {
                let mut endpoint =
                    tonic::transport::Endpoint::from_shared(format!("http://{}:{}", host, port))
                        .map_err(|e| ClientError::Build(e.to_string()))?
                        .timeout(Duration::from_secs(5));
                if options.is_keep_alive {
                    endpoint = endpoint
                        .tcp_keepalive(Some(Duration::from_secs(60)))
                        .keep_alive_while_idle(true);
                }
                ClientTransport::Grpc(endpoint)
            }
            CommunicationProtocol::Http => {
                let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(5));
                if !options.is_keep_alive {
                    builder = builder.pool_max_idle_per_host(0);
                }
                let client = builder
                    .build()
                    .map_err(|e| ClientError::Build(e.to_string()))?;
                ClientTransport::Http(client)
            }
        };

        debug!(logger, "Sidecar client constructed";
            "host" => host,
            "port" => port,
            "protocol" => protocol.as_str()
        );

        Ok(Self {
            host: host.to_string(),
            port: port.to_string(),
            protocol,
            transport,
            logger,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn protocol(&self) -> CommunicationProtocol {
        self.protocol
    }

    /// Base URL of the sidecar for REST calls.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Probe the sidecar's health endpoint.
    ///
    /// The HTTP actor capability calls this before serving actors; other
    /// callers may use it to gate readiness on the sidecar being up.
    pub async fn probe_health(&self) -> Result<(), ClientError> {
        match &self.transport {
            ClientTransport::Http(client) => {
                let url = format!("{}/v1.0/healthz", self.base_url());
                debug!(self.logger, "Probing sidecar health"; "url" => &url);

                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| ClientError::Connection(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(ClientError::UnexpectedStatus(response.status().as_u16()));
                }
                Ok(())
            }
            ClientTransport::Grpc(endpoint) => {
                debug!(self.logger, "Probing sidecar over gRPC";
                    "address" => self.base_url()
                );
                endpoint
                    .connect()
                    .await
                    .map(|_| ())
                    .map_err(|e| ClientError::Connection(e.to_string()))
            }
        }
    }

    /// REST client for sidecar calls. Only available in the HTTP flavor.
    pub fn http(&self) -> Option<&reqwest::Client> {
        match &self.transport {
            ClientTransport::Http(client) => Some(client),
            ClientTransport::Grpc(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slog::{o, Drain};

    fn create_test_logger() -> Logger {
        let decorator = slog_term::PlainDecorator::new(std::io::sink());
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!())
    }

    #[test]
    fn test_http_client_construction() {
        let client = DaprClient::new(
            "127.0.0.1",
            "50051",
            CommunicationProtocol::Http,
            &ClientOptions::default(),
            create_test_logger(),
        )
        .expect("Should build HTTP client");

        assert_eq!(client.host(), "127.0.0.1");
        assert_eq!(client.port(), "50051");
        assert_eq!(client.protocol(), CommunicationProtocol::Http);
        assert!(client.http().is_some());
    }

    #[test]
    fn test_grpc_client_construction() {
        let client = DaprClient::new(
            "127.0.0.1",
            "50051",
            CommunicationProtocol::Grpc,
            &ClientOptions::default(),
            create_test_logger(),
        )
        .expect("Should build gRPC client");

        assert_eq!(client.protocol(), CommunicationProtocol::Grpc);
        assert_eq!(client.base_url(), "http://127.0.0.1:50051");
        assert!(client.http().is_none());
    }

    #[test]
    fn test_keep_alive_disabled_still_constructs() {
        let options = ClientOptions { is_keep_alive: false };
        for protocol in [CommunicationProtocol::Http, CommunicationProtocol::Grpc] {
            let client = DaprClient::new(
                "127.0.0.1",
                "50051",
                protocol,
                &options,
                create_test_logger(),
            );
            assert!(client.is_ok());
        }
    }

    #[tokio::test]
    async fn test_probe_health_fails_without_sidecar() {
        // Port 9 (discard) is a safe address nothing listens on
        let client = DaprClient::new(
            "127.0.0.1",
            "9",
            CommunicationProtocol::Http,
            &ClientOptions::default(),
            create_test_logger(),
        )
        .expect("Should build client");

        assert!(client.probe_health().await.is_err());
    }
}
