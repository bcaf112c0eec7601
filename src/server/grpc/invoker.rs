//! Service invocation handle for the gRPC arm.

use crate::error::CapabilityError;
use crate::server::capabilities::ServerInvoker;
use crate::server::grpc::{GrpcCapabilityContext, GrpcServer};
use crate::server::registry::MethodHandler;
use std::sync::Arc;

pub struct GrpcServerInvoker {
    server: Arc<GrpcServer>,
}

impl GrpcServerInvoker {
    pub fn new(context: &GrpcCapabilityContext) -> Self {
        Self {
            server: context.server.clone(),
        }
    }
}

#[tonic::async_trait]
impl ServerInvoker for GrpcServerInvoker {
    async fn listen(&self, method: &str, handler: MethodHandler) -> Result<(), CapabilityError> {
        self.server.registry().add_method(method, handler).await
    }
}
