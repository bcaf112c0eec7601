//! Service invocation handle for the HTTP arm.

use crate::error::CapabilityError;
use crate::server::capabilities::ServerInvoker;
use crate::server::http::{HttpCapabilityContext, HttpServer};
use crate::server::registry::MethodHandler;
use std::sync::Arc;

pub struct HttpServerInvoker {
    server: Arc<HttpServer>,
}

impl HttpServerInvoker {
    pub fn new(context: &HttpCapabilityContext) -> Self {
        Self {
            server: context.server.clone(),
        }
    }
}

#[tonic::async_trait]
impl ServerInvoker for HttpServerInvoker {
    async fn listen(&self, method: &str, handler: MethodHandler) -> Result<(), CapabilityError> {
        self.server.registry().add_method(method, handler).await
    }
}
