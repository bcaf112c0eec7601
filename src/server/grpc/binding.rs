//! Input-binding handle for the gRPC arm.

use crate::error::CapabilityError;
use crate::server::capabilities::ServerBinding;
use crate::server::grpc::{GrpcCapabilityContext, GrpcServer};
use crate::server::registry::BindingHandler;
use std::sync::Arc;

pub struct GrpcServerBinding {
    server: Arc<GrpcServer>,
}

impl GrpcServerBinding {
    pub fn new(context: &GrpcCapabilityContext) -> Self {
        Self {
            server: context.server.clone(),
        }
    }
}

#[tonic::async_trait]
impl ServerBinding for GrpcServerBinding {
    async fn receive(&self, name: &str, handler: BindingHandler) -> Result<(), CapabilityError> {
        self.server.registry().add_binding(name, handler).await
    }
}
