//! Shared handler tables the transport servers dispatch from.
//!
//! Capability handles write into the registry; the transport server bound to
//! the same registry reads from it at request time, so registrations made
//! after `start` are still routable.

use crate::error::CapabilityError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A message delivered for a subscribed topic.
#[derive(Clone, Debug)]
pub struct TopicEvent {
    pub id: String,
    pub pubsub_name: String,
    pub topic: String,
    pub data: serde_json::Value,
}

/// An event delivered from an input binding.
#[derive(Clone, Debug)]
pub struct BindingEvent {
    pub name: String,
    pub data: serde_json::Value,
    pub metadata: HashMap<String, String>,
}

/// A service invocation addressed to this application.
#[derive(Clone, Debug)]
pub struct InvocationRequest {
    pub method: String,
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Response to a service invocation.
#[derive(Clone, Debug)]
pub struct InvocationResponse {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// A method call addressed to a hosted actor instance.
#[derive(Clone, Debug)]
pub struct ActorInvocation {
    pub actor_type: String,
    pub actor_id: String,
    pub method: String,
    pub data: Vec<u8>,
}

pub type TopicHandler =
    Arc<dyn Fn(TopicEvent) -> BoxFuture<Result<(), CapabilityError>> + Send + Sync>;
pub type BindingHandler =
    Arc<dyn Fn(BindingEvent) -> BoxFuture<Result<Vec<u8>, CapabilityError>> + Send + Sync>;
pub type MethodHandler = Arc<
    dyn Fn(InvocationRequest) -> BoxFuture<Result<InvocationResponse, CapabilityError>>
        + Send
        + Sync,
>;
pub type ActorHandler =
    Arc<dyn Fn(ActorInvocation) -> BoxFuture<Result<Vec<u8>, CapabilityError>> + Send + Sync>;

/// One registered topic subscription.
#[derive(Clone)]
pub struct Subscription {
    pub pubsub_name: String,
    pub topic: String,
    /// Route the sidecar should deliver events on (HTTP arm); informational
    /// for the gRPC arm.
    pub route: String,
    pub handler: TopicHandler,
}

/// Handler tables shared between one transport server and its capabilities.
#[derive(Default)]
pub struct HandlerRegistry {
    subscriptions: Mutex<Vec<Subscription>>,
    bindings: Mutex<HashMap<String, BindingHandler>>,
    methods: Mutex<HashMap<String, MethodHandler>>,
    actors: Mutex<HashMap<String, ActorHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a topic subscription. Duplicate (pubsub, topic) pairs are
    /// rejected.
    pub async fn add_subscription(&self, subscription: Subscription) -> Result<(), CapabilityError> {
        let mut subscriptions = self.subscriptions.lock().await;
        let duplicate = subscriptions.iter().any(|s| {
            s.pubsub_name == subscription.pubsub_name && s.topic == subscription.topic
        });
        if duplicate {
            return Err(CapabilityError::AlreadyRegistered(format!(
                "{}/{}",
                subscription.pubsub_name, subscription.topic
            )));
        }
        subscriptions.push(subscription);
        Ok(())
    }

    pub async fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.lock().await.clone()
    }

    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.lock().await.len()
    }

    pub async fn topic_handler(&self, pubsub_name: &str, topic: &str) -> Option<TopicHandler> {
        self.subscriptions
            .lock()
            .await
            .iter()
            .find(|s| s.pubsub_name == pubsub_name && s.topic == topic)
            .map(|s| s.handler.clone())
    }

    pub async fn add_binding(
        &self,
        name: &str,
        handler: BindingHandler,
    ) -> Result<(), CapabilityError> {
        let mut bindings = self.bindings.lock().await;
        if bindings.contains_key(name) {
            return Err(CapabilityError::AlreadyRegistered(name.to_string()));
        }
        bindings.insert(name.to_string(), handler);
        Ok(())
    }

    pub async fn binding_handler(&self, name: &str) -> Option<BindingHandler> {
        self.bindings.lock().await.get(name).cloned()
    }

    pub async fn binding_names(&self) -> Vec<String> {
        self.bindings.lock().await.keys().cloned().collect()
    }

    pub async fn add_method(
        &self,
        method: &str,
        handler: MethodHandler,
    ) -> Result<(), CapabilityError> {
        let mut methods = self.methods.lock().await;
        if methods.contains_key(method) {
            return Err(CapabilityError::AlreadyRegistered(method.to_string()));
        }
        methods.insert(method.to_string(), handler);
        Ok(())
    }

    pub async fn method_handler(&self, method: &str) -> Option<MethodHandler> {
        self.methods.lock().await.get(method).cloned()
    }

    pub async fn add_actor(
        &self,
        actor_type: &str,
        handler: ActorHandler,
    ) -> Result<(), CapabilityError> {
        let mut actors = self.actors.lock().await;
        if actors.contains_key(actor_type) {
            return Err(CapabilityError::AlreadyRegistered(actor_type.to_string()));
        }
        actors.insert(actor_type.to_string(), handler);
        Ok(())
    }

    pub async fn actor_handler(&self, actor_type: &str) -> Option<ActorHandler> {
        self.actors.lock().await.get(actor_type).cloned()
    }

    pub async fn actor_types(&self) -> Vec<String> {
        self.actors.lock().await.keys().cloned().collect()
    }
}
