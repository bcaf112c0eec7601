//! Actor hosting handle for the gRPC arm.
//!
//! Receives the same builder context as the HTTP implementation but does not
//! retain the client: over gRPC the sidecar learns hosted actor types through
//! `ListRegisteredActors` on the callback channel, so no call back into the
//! sidecar is needed. The asymmetry with the HTTP arm is preserved as
//! observed in the original behavior.

use crate::error::CapabilityError;
use crate::server::capabilities::ServerActor;
use crate::server::grpc::{GrpcCapabilityContext, GrpcServer};
use crate::server::registry::ActorHandler;
use std::sync::Arc;

pub struct GrpcServerActor {
    server: Arc<GrpcServer>,
}

impl GrpcServerActor {
    pub fn new(context: &GrpcCapabilityContext) -> Self {
        Self {
            server: context.server.clone(),
        }
    }
}

#[tonic::async_trait]
impl ServerActor for GrpcServerActor {
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
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DaprClient;
    use crate::config::{ClientOptions, CommunicationProtocol};
    use crate::server::capabilities::actor_handler;
    use slog::{o, Drain, Logger};

    fn create_test_logger() -> Logger {
        let decorator = slog_term::PlainDecorator::new(std::io::sink());
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!())
    }

    #[tokio::test]
    async fn test_init_needs_no_sidecar() {
        let logger = create_test_logger();
        // Sidecar address nothing listens on; init must still succeed because
        // the gRPC actor never calls back into the sidecar
        let client = Arc::new(
            DaprClient::new(
                "127.0.0.1",
                "9",
                CommunicationProtocol::Grpc,
                &ClientOptions::default(),
                logger.clone(),
            )
            .expect("Should build client"),
        );

        let context = GrpcCapabilityContext {
            server: Arc::new(GrpcServer::new(logger)),
            client,
        };

        let actor = GrpcServerActor::new(&context);
        assert!(actor.init().await.is_ok());
    }

    #[tokio::test]
    async fn test_register_and_list_actors() {
        let logger = create_test_logger();
        let client = Arc::new(
            DaprClient::new(
                "127.0.0.1",
                "50051",
                CommunicationProtocol::Grpc,
                &ClientOptions::default(),
                logger.clone(),
            )
            .expect("Should build client"),
        );

        let context = GrpcCapabilityContext {
            server: Arc::new(GrpcServer::new(logger)),
            client,
        };

        let actor = GrpcServerActor::new(&context);
        actor
            .register_actor("Counter", actor_handler(|_invocation| async { Ok(Vec::new()) }))
            .await
            .expect("Should register actor");

        assert_eq!(actor.registered_actors().await, vec!["Counter".to_string()]);
    }
}
