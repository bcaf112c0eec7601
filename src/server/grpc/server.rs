//! RPC-style transport server.
//!
//! Serves the generated `AppCallback` service: subscription listing, topic
//! event delivery, binding events, method invocation, and actor invocation.

use crate::error::ServerError;
use crate::server::grpc::proto::app_callback_server::{AppCallback, AppCallbackServer};
use crate::server::grpc::proto::{
    topic_event_response::TopicEventResponseStatus, ActorInvokeRequest, ActorInvokeResponse,
    BindingEventRequest, BindingEventResponse, InvokeRequest, InvokeResponse,
    ListInputBindingsRequest, ListInputBindingsResponse, ListRegisteredActorsRequest,
    ListRegisteredActorsResponse, ListTopicSubscriptionsRequest, ListTopicSubscriptionsResponse,
    TopicEventRequest, TopicEventResponse, TopicSubscription,
};
use crate::server::registry::{
    ActorInvocation, BindingEvent, HandlerRegistry, InvocationRequest, TopicEvent,
};
use crate::server::transport::TransportServer;
use slog::{debug, error, info, Logger};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{transport::Server, Request, Response, Status};

/// gRPC transport server bound to one handler registry.
pub struct GrpcServer {
    registry: Arc<HandlerRegistry>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    logger: Logger,
}

impl GrpcServer {
    pub fn new(logger: Logger) -> Self {
        Self {
            registry: Arc::new(HandlerRegistry::new()),
            shutdown: Mutex::new(None),
            task: Mutex::new(None),
            logger,
        }
    }

    pub(crate) fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }
}

#[tonic::async_trait]
impl TransportServer for GrpcServer {
    async fn start(&self, host: &str, port: &str) -> Result<(), ServerError> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return Err(ServerError::Startup("gRPC server already started".to_string()));
        }

        let address: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| ServerError::Startup(format!("Invalid address: {}", e)))?;

        info!(self.logger, "Starting gRPC server"; "address" => %address);

        let listener = tokio::net::TcpListener::bind(address).await.map_err(|e| {
            error!(self.logger, "Failed to bind gRPC server"; "error" => %e);
            ServerError::Startup(e.to_string())
        })?;
        let incoming = TcpListenerStream::new(listener);

        let service = AppCallbackService {
            registry: self.registry.clone(),
            logger: self.logger.clone(),
        };

        let (tx, rx) = oneshot::channel::<()>();
        let logger = self.logger.clone();

        let handle = tokio::spawn(async move {
            let result = Server::builder()
                .add_service(AppCallbackServer::new(service))
                .serve_with_incoming_shutdown(incoming, async {
                    rx.await.ok();
                })
                .await;
            if let Err(e) = result {
                error!(logger, "gRPC server error"; "error" => %e);
            }
        });

        *self.shutdown.lock().await = Some(tx);
        *task = Some(handle);

        info!(self.logger, "gRPC server listening"; "address" => %address);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServerError> {
        info!(self.logger, "Stopping gRPC server");

        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.task.lock().await.take() {
            handle
                .await
                .map_err(|e| ServerError::Shutdown(e.to_string()))?;
        }

        info!(self.logger, "gRPC server stopped");
        Ok(())
    }

    async fn stop_listener(&self) -> Result<(), ServerError> {
        info!(self.logger, "Aborting gRPC listener");

        self.shutdown.lock().await.take();

        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(ServerError::Shutdown(e.to_string())),
            }
        }

        Ok(())
    }
}

struct AppCallbackService {
    registry: Arc<HandlerRegistry>,
    logger: Logger,
}

#[tonic::async_trait]
impl AppCallback for AppCallbackService {
    async fn list_topic_subscriptions(
        &self,
        _request: Request<ListTopicSubscriptionsRequest>,
    ) -> Result<Response<ListTopicSubscriptionsResponse>, Status> {
        let subscriptions = self
            .registry
            .subscriptions()
            .await
            .iter()
            .map(|s| TopicSubscription {
                pubsub_name: s.pubsub_name.clone(),
                topic: s.topic.clone(),
                route: s.route.clone(),
            })
            .collect();

        Ok(Response::new(ListTopicSubscriptionsResponse { subscriptions }))
    }

    async fn on_topic_event(
        &self,
        request: Request<TopicEventRequest>,
    ) -> Result<Response<TopicEventResponse>, Status> {
        let req = request.into_inner();

        debug!(self.logger, "Topic event received";
            "pubsub" => &req.pubsub_name,
            "topic" => &req.topic
        );

        let handler = self
            .registry
            .topic_handler(&req.pubsub_name, &req.topic)
            .await
            .ok_or_else(|| {
                Status::not_found(format!(
                    "No subscription for {}/{}",
                    req.pubsub_name, req.topic
                ))
            })?;

        let data = if req.data.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&req.data)
                .map_err(|e| Status::invalid_argument(format!("Invalid event payload: {}", e)))?
        };

        let event = TopicEvent {
            id: req.id,
            pubsub_name: req.pubsub_name.clone(),
            topic: req.topic.clone(),
            data,
        };

        let status = match handler(event).await {
            Ok(()) => TopicEventResponseStatus::Success,
            Err(e) => {
                error!(self.logger, "Topic handler failed";
                    "pubsub" => &req.pubsub_name,
                    "topic" => &req.topic,
                    "error" => %e
                );
                TopicEventResponseStatus::Retry
            }
        };

        Ok(Response::new(TopicEventResponse {
            status: status as i32,
        }))
    }

    async fn list_input_bindings(
        &self,
        _request: Request<ListInputBindingsRequest>,
    ) -> Result<Response<ListInputBindingsResponse>, Status> {
        Ok(Response::new(ListInputBindingsResponse {
            bindings: self.registry.binding_names().await,
        }))
    }

    async fn on_binding_event(
        &self,
        request: Request<BindingEventRequest>,
    ) -> Result<Response<BindingEventResponse>, Status> {
        let req = request.into_inner();

        debug!(self.logger, "Binding event received"; "binding" => &req.name);

        let handler = self
            .registry
            .binding_handler(&req.name)
            .await
            .ok_or_else(|| Status::not_found(format!("No binding named {}", req.name)))?;

        let data = if req.data.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&req.data)
                .map_err(|e| Status::invalid_argument(format!("Invalid event payload: {}", e)))?
        };

        let event = BindingEvent {
            name: req.name.clone(),
            data,
            metadata: req.metadata,
        };

        let data = handler(event)
            .await
            .map_err(|e| Status::internal(format!("Binding handler failed: {}", e)))?;

        Ok(Response::new(BindingEventResponse { data }))
    }

    async fn on_invoke(
        &self,
        request: Request<InvokeRequest>,
    ) -> Result<Response<InvokeResponse>, Status> {
        let req = request.into_inner();

        debug!(self.logger, "Invocation received"; "method" => &req.method);

        let handler = self
            .registry
            .method_handler(&req.method)
            .await
            .ok_or_else(|| Status::not_found(format!("No method named {}", req.method)))?;

        let invocation = InvocationRequest {
            method: req.method.clone(),
            data: req.data,
            content_type: req.content_type,
        };

        let response = handler(invocation)
            .await
            .map_err(|e| Status::internal(format!("Invocation handler failed: {}", e)))?;

        Ok(Response::new(InvokeResponse {
            data: response.data,
            content_type: response.content_type,
        }))
    }

    async fn on_actor_invoke(
        &self,
        request: Request<ActorInvokeRequest>,
    ) -> Result<Response<ActorInvokeResponse>, Status> {
        let req = request.into_inner();

        debug!(self.logger, "Actor invocation received";
            "actor_type" => &req.actor_type,
            "actor_id" => &req.actor_id,
            "method" => &req.method
        );

        let handler = self
            .registry
            .actor_handler(&req.actor_type)
            .await
            .ok_or_else(|| Status::not_found(format!("No actor type named {}", req.actor_type)))?;

        let invocation = ActorInvocation {
            actor_type: req.actor_type,
            actor_id: req.actor_id,
            method: req.method,
            data: req.data,
        };

        let data = handler(invocation)
            .await
            .map_err(|e| Status::internal(format!("Actor handler failed: {}", e)))?;

        Ok(Response::new(ActorInvokeResponse { data }))
    }

    async fn list_registered_actors(
        &self,
        _request: Request<ListRegisteredActorsRequest>,
    ) -> Result<Response<ListRegisteredActorsResponse>, Status> {
        Ok(Response::new(ListRegisteredActorsResponse {
            actor_types: self.registry.actor_types().await,
        }))
    }
}
