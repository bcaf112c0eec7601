//! Topic subscription handle for the gRPC arm.

use crate::error::CapabilityError;
use crate::server::capabilities::ServerPubSub;
use crate::server::grpc::{GrpcCapabilityContext, GrpcServer};
use crate::server::registry::{Subscription, TopicHandler};
use std::sync::Arc;

pub struct GrpcServerPubSub {
    server: Arc<GrpcServer>,
}

impl GrpcServerPubSub {
    pub fn new(context: &GrpcCapabilityContext) -> Self {
        Self {
            server: context.server.clone(),
        }
    }
}

#[tonic::async_trait]
impl ServerPubSub for GrpcServerPubSub {
    async fn subscribe(
        &self,
        pubsub_name: &str,
        topic: &str,
        handler: TopicHandler,
    ) -> Result<(), CapabilityError> {
        // Events arrive over OnTopicEvent; the route is informational only
        let route = format!("{}/{}", pubsub_name, topic);

        self.server
            .registry()
            .add_subscription(Subscription {
                pubsub_name: pubsub_name.to_string(),
                topic: topic.to_string(),
                route,
                handler,
            })
            .await
    }

    async fn subscription_count(&self) -> usize {
        self.server.registry().subscription_count().await
    }
}
