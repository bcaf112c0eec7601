//! Topic subscription handle for the HTTP arm.

use crate::error::CapabilityError;
use crate::server::capabilities::ServerPubSub;
use crate::server::http::{HttpCapabilityContext, HttpServer};
use crate::server::registry::{Subscription, TopicHandler};
use std::sync::Arc;

pub struct HttpServerPubSub {
    server: Arc<HttpServer>,
}

impl HttpServerPubSub {
    pub fn new(context: &HttpCapabilityContext) -> Self {
        Self {
            server: context.server.clone(),
        }
    }
}

#[tonic::async_trait]
impl ServerPubSub for HttpServerPubSub {
    async fn subscribe(
        &self,
        pubsub_name: &str,
        topic: &str,
        handler: TopicHandler,
    ) -> Result<(), CapabilityError> {
        // Route the sidecar delivers events on; listed by /dapr/subscribe
        let route = format!("/events/{}/{}", pubsub_name, topic);

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
