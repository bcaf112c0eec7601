//! The four capability handles a hosting application uses regardless of
//! protocol.
//!
//! Each trait has exactly one concrete implementation per protocol, selected
//! at construction time. Code written against these traits behaves
//! identically whether the handles came from the HTTP or the gRPC arm,
//! differing only in wire behavior.

use crate::error::CapabilityError;
use crate::server::registry::{
    ActorHandler, ActorInvocation, BindingEvent, BindingHandler, InvocationRequest,
    InvocationResponse, MethodHandler, TopicEvent, TopicHandler,
};
use std::future::Future;
use std::sync::Arc;

/// Topic subscription registration.
#[tonic::async_trait]
pub trait ServerPubSub: Send + Sync {
    /// Subscribe to a topic on the named pubsub component.
    async fn subscribe(
        &self,
        pubsub_name: &str,
        topic: &str,
        handler: TopicHandler,
    ) -> Result<(), CapabilityError>;

    async fn subscription_count(&self) -> usize;
}

/// Input-binding event registration.
#[tonic::async_trait]
pub trait ServerBinding: Send + Sync {
    /// Listen for events on the named input binding.
    async fn receive(&self, name: &str, handler: BindingHandler) -> Result<(), CapabilityError>;
}

/// Service invocation routing.
#[tonic::async_trait]
pub trait ServerInvoker: Send + Sync {
    /// Route invocations of the named method to the given handler.
    async fn listen(&self, method: &str, handler: MethodHandler) -> Result<(), CapabilityError>;
}

/// Actor hosting.
#[tonic::async_trait]
pub trait ServerActor: Send + Sync {
    /// Register an actor type and the handler that serves its method calls.
    async fn register_actor(
        &self,
        actor_type: &str,
        handler: ActorHandler,
    ) -> Result<(), CapabilityError>;

    async fn registered_actors(&self) -> Vec<String>;

    /// Prepare actor hosting. The HTTP implementation confirms sidecar
    /// reachability through the shared client; the gRPC implementation has
    /// nothing to do here.
    async fn init(&self) -> Result<(), CapabilityError>;
}

/// The immutable set of four capability handles exposed after construction.
pub struct CapabilitySet {
    pub(crate) pubsub: Arc<dyn ServerPubSub>,
    pub(crate) binding: Arc<dyn ServerBinding>,
    pub(crate) invoker: Arc<dyn ServerInvoker>,
    pub(crate) actor: Arc<dyn ServerActor>,
}

/// Wrap an async closure as a [`TopicHandler`].
pub fn topic_handler<F, Fut>(f: F) -> TopicHandler
where
    F: Fn(TopicEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CapabilityError>> + Send + 'static,
{
    Arc::new(move |event| Box::pin(f(event)))
}

/// Wrap an async closure as a [`BindingHandler`].
pub fn binding_handler<F, Fut>(f: F) -> BindingHandler
where
    F: Fn(BindingEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>, CapabilityError>> + Send + 'static,
{
    Arc::new(move |event| Box::pin(f(event)))
}

/// Wrap an async closure as a [`MethodHandler`].
pub fn method_handler<F, Fut>(f: F) -> MethodHandler
where
    F: Fn(InvocationRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<InvocationResponse, CapabilityError>> + Send + 'static,
{
    Arc::new(move |request| Box::pin(f(request)))
}

/// Wrap an async closure as an [`ActorHandler`].
pub fn actor_handler<F, Fut>(f: F) -> ActorHandler
where
    F: Fn(ActorInvocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>, CapabilityError>> + Send + 'static,
{
    Arc::new(move |invocation| Box::pin(f(invocation)))
}
