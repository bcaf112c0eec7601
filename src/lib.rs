pub mod ambient;
pub mod client;
pub mod config;
pub mod error;
pub mod server;

pub use client::{ClientError, DaprClient};
pub use config::{ClientOptions, CommunicationProtocol, ConfigError, ServerConfig};
pub use error::{BuildError, CapabilityError, ServerError};
pub use server::capabilities::{
    actor_handler, binding_handler, method_handler, topic_handler, ServerActor, ServerBinding,
    ServerInvoker, ServerPubSub,
};
pub use server::registry::{
    ActorInvocation, BindingEvent, InvocationRequest, InvocationResponse, TopicEvent,
};
pub use server::{DaprServer, LifecycleState};
