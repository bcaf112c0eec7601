//! Input-binding handle for the HTTP arm.

use crate::error::CapabilityError;
use crate::server::capabilities::ServerBinding;
use crate::server::http::{HttpCapabilityContext, HttpServer};
use crate::server::registry::BindingHandler;
use std::sync::Arc;

pub struct HttpServerBinding {
    server: Arc<HttpServer>,
}

impl HttpServerBinding {
    pub fn new(context: &HttpCapabilityContext) -> Self {
        Self {
            server: context.server.clone(),
        }
    }
}

#[tonic::async_trait]
impl ServerBinding for HttpServerBinding {
    async fn receive(&self, name: &str, handler: BindingHandler) -> Result<(), CapabilityError> {
        self.server.registry().add_binding(name, handler).await
    }
}
