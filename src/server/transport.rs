//! Contract every concrete transport server satisfies.

use crate::error::ServerError;

/// A protocol-specific listener the facade owns exclusively.
///
/// `stop` is a graceful teardown that drains in-flight work; `stop_listener`
/// is a distinct, harder teardown that aborts the listener immediately. The
/// two must remain separate operations, not aliases.
#[tonic::async_trait]
pub trait TransportServer: Send + Sync {
    /// Bind and start serving on `host:port`.
    async fn start(&self, host: &str, port: &str) -> Result<(), ServerError>;

    /// Gracefully stop serving, waiting for in-flight requests.
    async fn stop(&self) -> Result<(), ServerError>;

    /// Abort the listener without draining.
    async fn stop_listener(&self) -> Result<(), ServerError>;
}
