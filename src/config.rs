//! Configuration for the application-side server and its sidecar client.

use crate::ambient;

/// Wire protocol used between the application and the sidecar.
///
/// The enumeration is closed. Anything parsed from the outside that is not a
/// recognized protocol name resolves to `Http` by explicit fallback policy,
/// never by error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommunicationProtocol {
    #[default]
    Http,
    Grpc,
}

impl CommunicationProtocol {
    /// Parse a protocol name, falling back to HTTP for unknown values.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "grpc" => CommunicationProtocol::Grpc,
            _ => CommunicationProtocol::Http,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationProtocol::Http => "http",
            CommunicationProtocol::Grpc => "grpc",
        }
    }
}

/// Options for the outbound sidecar client.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Reuse connections to the sidecar between requests.
    pub is_keep_alive: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { is_keep_alive: true }
    }
}

/// Errors raised while validating a [`ServerConfig`].
///
/// Each variant identifies which port field was rejected. Validation happens
/// before any other component is constructed, so a failure never leaves a
/// partially-built server behind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The application server port is not composed only of decimal digits
    InvalidServerPort(String),
    /// The sidecar port is not composed only of decimal digits
    InvalidSidecarPort(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidServerPort(port) => {
                write!(f, "INVALID_SERVER_PORT: server port '{}' must contain only digits", port)
            }
            ConfigError::InvalidSidecarPort(port) => {
                write!(f, "INVALID_SIDECAR_PORT: sidecar port '{}' must contain only digits", port)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for constructing a [`DaprServer`](crate::server::DaprServer).
///
/// Every field has a documented default; the struct is built once and
/// validated before any other component is constructed.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host the application server listens on (default `"127.0.0.1"`)
    pub server_host: String,

    /// Port the application server listens on, as a string of decimal digits.
    /// Defaults to the ambient bus value, then the `DAPR_SERVER_PORT`
    /// environment variable, then `"50050"`.
    pub server_port: String,

    /// Host of the sidecar process (default `"127.0.0.1"`)
    pub dapr_host: String,

    /// Port of the sidecar process, digits only (default `"50051"`)
    pub dapr_port: String,

    /// Wire protocol for both the server and the sidecar client
    pub protocol: CommunicationProtocol,

    /// Options for the outbound sidecar client
    pub client_options: ClientOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let server_port = ambient::server_port()
            .or_else(|| std::env::var(ambient::SERVER_PORT_KEY).ok())
            .unwrap_or_else(|| "50050".to_string());

        Self {
            server_host: "127.0.0.1".to_string(),
            server_port,
            dapr_host: "127.0.0.1".to_string(),
            dapr_port: "50051".to_string(),
            protocol: CommunicationProtocol::default(),
            client_options: ClientOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server_host(mut self, host: impl Into<String>) -> Self {
        self.server_host = host.into();
        self
    }

    pub fn with_server_port(mut self, port: impl Into<String>) -> Self {
        self.server_port = port.into();
        self
    }

    pub fn with_dapr_host(mut self, host: impl Into<String>) -> Self {
        self.dapr_host = host.into();
        self
    }

    pub fn with_dapr_port(mut self, port: impl Into<String>) -> Self {
        self.dapr_port = port.into();
        self
    }

    pub fn with_protocol(mut self, protocol: CommunicationProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_client_options(mut self, options: ClientOptions) -> Self {
        self.client_options = options;
        self
    }

    /// Check both port fields and publish the resolved values.
    ///
    /// On success the resolved ports are written to the ambient bus so
    /// collaborators constructed later in the process can discover them.
    /// On failure nothing is published and no other component may be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_all_digits(&self.server_port) {
            return Err(ConfigError::InvalidServerPort(self.server_port.clone()));
        }

        if !is_all_digits(&self.dapr_port) {
            return Err(ConfigError::InvalidSidecarPort(self.dapr_port.clone()));
        }

        ambient::publish(ambient::SERVER_PORT_KEY, &self.server_port);
        ambient::publish(ambient::CLIENT_PORT_KEY, &self.dapr_port);

        Ok(())
    }
}

fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
