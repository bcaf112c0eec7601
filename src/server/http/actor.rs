//! Actor hosting handle for the HTTP arm.
//!
//! Unlike its gRPC counterpart, this implementation holds the shared sidecar
//! client: actor hosting over REST needs a channel back into the sidecar
//! (reachability checks before serving, and state operations in handlers).

use crate::client::DaprClient;
use crate::error::CapabilityError;
use crate::server::capabilities::ServerActor;
use crate::server::http::{HttpCapabilityContext, HttpServer};
use crate::server::registry::ActorHandler;
use std::sync::Arc;

pub struct HttpServerActor {
    server: Arc<HttpServer>,
    client: Arc<DaprClient>,
}

impl HttpServerActor {
    pub fn new(context: &HttpCapabilityContext) -> Self {
        Self {
            server: context.server.clone(),
            client: context.client.clone(),
        }
    }

    pub(crate) fn client(&self) -> &Arc<DaprClient> {
        &self.client
    }
}

#[tonic::async_trait]
impl ServerActor for HttpServerActor {
    async fn register_actor(
        &self,
        actor_type: &str,
        handler: ActorHandler,
    ) -> Result<(), CapabilityError> {
        self.server.registry().add_actor(actor_type, handler).await
    }

    async fn registered_actors(&self) -> Vec<String> {
        self.server.registry().actor_types().await
    }

    async fn init(&self) -> Result<(), CapabilityError> {
        // Actors cannot be served without a reachable sidecar
        self.client
            .probe_health()
            .await
            .map_err(|e| CapabilityError::Sidecar(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientOptions, CommunicationProtocol};
    use slog::{o, Drain, Logger};

    fn create_test_logger() -> Logger {
        let decorator = slog_term::PlainDecorator::new(std::io::sink());
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!())
    }

    #[tokio::test]
    async fn test_actor_shares_the_context_client() {
        let logger = create_test_logger();
        let client = Arc::new(
            DaprClient::new(
                "127.0.0.1",
                "50051",
                CommunicationProtocol::Http,
                &ClientOptions::default(),
                logger.clone(),
            )
            .expect("Should build client"),
        );

        let context = HttpCapabilityContext {
            server: Arc::new(HttpServer::new(logger)),
            client: client.clone(),
        };

        let actor = HttpServerActor::new(&context);
        assert!(Arc::ptr_eq(actor.client(), &client));
    }
}
