//! Error types for server construction, lifecycle, and capability registration.

use crate::client::ClientError;
use crate::config::ConfigError;
use std::fmt;

/// Errors raised synchronously while constructing a
/// [`DaprServer`](crate::server::DaprServer).
///
/// Construction is all-or-nothing: a failure never yields a partial server.
#[derive(Debug)]
pub enum BuildError {
    /// Configuration validation failed
    Config(ConfigError),
    /// The outbound sidecar client could not be constructed
    Client(ClientError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Config(e) => write!(f, "Configuration error: {}", e),
            BuildError::Client(e) => write!(f, "Client error: {}", e),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<ConfigError> for BuildError {
    fn from(e: ConfigError) -> Self {
        BuildError::Config(e)
    }
}

impl From<ClientError> for BuildError {
    fn from(e: ClientError) -> Self {
        BuildError::Client(e)
    }
}

/// Errors surfaced by the asynchronous lifecycle operations.
///
/// Failures are pass-through from the underlying transport server; nothing is
/// recovered or retried at this layer.
#[derive(Clone, Debug)]
pub enum ServerError {
    /// Failed to start the transport server
    Startup(String),
    /// Failed to stop the transport server
    Shutdown(String),
    /// `start` was called while the server is already running
    AlreadyRunning,
    /// `start` was called after the server was stopped; restart is not offered
    AlreadyStopped,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Startup(reason) => write!(f, "Failed to start server: {}", reason),
            ServerError::Shutdown(reason) => write!(f, "Failed to stop server: {}", reason),
            ServerError::AlreadyRunning => write!(f, "Server is already running"),
            ServerError::AlreadyStopped => {
                write!(f, "Server was stopped and cannot be started again")
            }
        }
    }
}

impl std::error::Error for ServerError {}

/// Errors raised by capability handles during registration or dispatch.
#[derive(Clone, Debug)]
pub enum CapabilityError {
    /// A handler is already registered under the same key
    AlreadyRegistered(String),
    /// No handler is registered under the given key
    NotRegistered(String),
    /// A registered handler failed while processing an event
    Handler(String),
    /// A call back into the sidecar failed
    Sidecar(String),
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityError::AlreadyRegistered(key) => {
                write!(f, "Handler for '{}' is already registered", key)
            }
            CapabilityError::NotRegistered(key) => {
                write!(f, "No handler registered for '{}'", key)
            }
            CapabilityError::Handler(reason) => write!(f, "Handler failed: {}", reason),
            CapabilityError::Sidecar(reason) => write!(f, "Sidecar call failed: {}", reason),
        }
    }
}

impl std::error::Error for CapabilityError {}
