//! REST-style transport server and its capability implementations.

pub mod actor;
pub mod binding;
pub mod invoker;
pub mod pubsub;
pub mod server;

use crate::client::DaprClient;
use std::sync::Arc;

pub use actor::HttpServerActor;
pub use binding::HttpServerBinding;
pub use invoker::HttpServerInvoker;
pub use pubsub::HttpServerPubSub;
pub use server::HttpServer;

/// Context handed to every HTTP capability builder.
///
/// All builders receive the same structure; each retains only what it needs.
/// Today only the actor implementation keeps the client.
#[derive(Clone)]
pub struct HttpCapabilityContext {
    pub server: Arc<HttpServer>,
    pub client: Arc<DaprClient>,
}
