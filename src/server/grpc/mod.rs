//! RPC-style transport server and its capability implementations.

pub mod actor;
pub mod binding;
pub mod invoker;
pub mod pubsub;
pub mod server;

use crate::client::DaprClient;
use std::sync::Arc;

// Generated callback service the sidecar drives
pub mod proto {
    tonic::include_proto!("daprside.v1");
}

pub use actor::GrpcServerActor;
pub use binding::GrpcServerBinding;
pub use invoker::GrpcServerInvoker;
pub use pubsub::GrpcServerPubSub;
pub use server::GrpcServer;

/// Context handed to every gRPC capability builder.
///
/// Mirrors the HTTP context so all builders share one shape; the gRPC actor
/// implementation does not retain the client.
#[derive(Clone)]
pub struct GrpcCapabilityContext {
    pub server: Arc<GrpcServer>,
    pub client: Arc<DaprClient>,
}
