//! REST-style transport server.
//!
//! Serves the callback surface the sidecar drives over HTTP: subscription
//! listing, topic event delivery, binding events, method invocation, actor
//! invocation, and the actor configuration endpoint.

use crate::error::ServerError;
use crate::server::registry::{
    ActorInvocation, BindingEvent, HandlerRegistry, InvocationRequest, TopicEvent,
};
use crate::server::transport::TransportServer;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use slog::{debug, error, info, Logger};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;

/// HTTP transport server bound to one handler registry.
pub struct HttpServer {
    registry: Arc<HandlerRegistry>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    logger: Logger,
}

#[derive(Clone)]
struct AppState {
    registry: Arc<HandlerRegistry>,
    logger: Logger,
}

impl HttpServer {
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

    fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            logger: self.logger.clone(),
        };

        Router::new()
            .route("/healthz", get(handle_health))
            .route("/dapr/subscribe", get(handle_subscription_list))
            .route("/dapr/config", get(handle_actor_config))
            .route("/events/:pubsub/:topic", post(handle_topic_event))
            .route("/bindings/:name", post(handle_binding_event))
            .route("/invoke/:method", post(handle_invoke))
            .route(
                "/actors/:actor_type/:actor_id/method/:method",
                put(handle_actor_invoke),
            )
            // CORS for browser-hosted callers
            .layer(CorsLayer::permissive())
            .with_state(state)
    }
}

#[tonic::async_trait]
impl TransportServer for HttpServer {
    async fn start(&self, host: &str, port: &str) -> Result<(), ServerError> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return Err(ServerError::Startup("HTTP server already started".to_string()));
        }

        let address: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| ServerError::Startup(format!("Invalid address: {}", e)))?;

        info!(self.logger, "Starting HTTP server"; "address" => %address);

        let listener = tokio::net::TcpListener::bind(address).await.map_err(|e| {
            error!(self.logger, "Failed to bind HTTP server"; "error" => %e);
            ServerError::Startup(e.to_string())
        })?;

        let app = self.router();
        let (tx, rx) = oneshot::channel::<()>();
        let logger = self.logger.clone();

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    rx.await.ok();
                })
                .await;
            if let Err(e) = result {
                error!(logger, "HTTP server error"; "error" => %e);
            }
        });

        *self.shutdown.lock().await = Some(tx);
        *task = Some(handle);

        info!(self.logger, "HTTP server listening"; "address" => %address);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServerError> {
        info!(self.logger, "Stopping HTTP server");

        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.task.lock().await.take() {
            handle
                .await
                .map_err(|e| ServerError::Shutdown(e.to_string()))?;
        }

        info!(self.logger, "HTTP server stopped");
        Ok(())
    }

    async fn stop_listener(&self) -> Result<(), ServerError> {
        info!(self.logger, "Aborting HTTP listener");

        // Drop the shutdown channel so the serve task cannot linger on it
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

#[derive(Debug, serde::Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Entry in the subscription listing, in the shape the sidecar expects.
#[derive(Debug, serde::Serialize)]
struct SubscriptionEntry {
    pubsubname: String,
    topic: String,
    route: String,
}

#[derive(Debug, serde::Serialize)]
struct ActorConfigResponse {
    entities: Vec<String>,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Subscription listing the sidecar polls to learn delivery routes.
async fn handle_subscription_list(State(state): State<AppState>) -> Json<Vec<SubscriptionEntry>> {
    let subscriptions = state
        .registry
        .subscriptions()
        .await
        .iter()
        .map(|s| SubscriptionEntry {
            pubsubname: s.pubsub_name.clone(),
            topic: s.topic.clone(),
            route: s.route.clone(),
        })
        .collect();

    Json(subscriptions)
}

/// Actor configuration the sidecar polls to learn hosted actor types.
async fn handle_actor_config(State(state): State<AppState>) -> Json<ActorConfigResponse> {
    Json(ActorConfigResponse {
        entities: state.registry.actor_types().await,
    })
}

async fn handle_topic_event(
    State(state): State<AppState>,
    Path((pubsub, topic)): Path<(String, String)>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    debug!(state.logger, "Topic event received";
        "pubsub" => &pubsub,
        "topic" => &topic
    );

    let handler = match state.registry.topic_handler(&pubsub, &topic).await {
        Some(handler) => handler,
        None => {
            return (
                StatusCode::NOT_FOUND,
                format!("No subscription for {}/{}", pubsub, topic),
            )
                .into_response();
        }
    };

    let id = payload
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let event = TopicEvent {
        id,
        pubsub_name: pubsub.clone(),
        topic: topic.clone(),
        data: payload,
    };

    match handler(event).await {
        Ok(()) => Json(serde_json::json!({ "status": "SUCCESS" })).into_response(),
        Err(e) => {
            error!(state.logger, "Topic handler failed";
                "pubsub" => &pubsub,
                "topic" => &topic,
                "error" => %e
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "status": "RETRY" })),
            )
                .into_response()
        }
    }
}

async fn handle_binding_event(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    debug!(state.logger, "Binding event received"; "binding" => &name);

    let handler = match state.registry.binding_handler(&name).await {
        Some(handler) => handler,
        None => {
            return (StatusCode::NOT_FOUND, format!("No binding named {}", name)).into_response();
        }
    };

    let metadata: HashMap<String, String> = headers
        .iter()
        .filter_map(|(key, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (key.as_str().to_string(), v.to_string()))
        })
        .collect();

    let event = BindingEvent {
        name: name.clone(),
        data: payload,
        metadata,
    };

    match handler(event).await {
        Ok(data) => (StatusCode::OK, data).into_response(),
        Err(e) => {
            error!(state.logger, "Binding handler failed"; "binding" => &name, "error" => %e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn handle_invoke(
    State(state): State<AppState>,
    Path(method): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    debug!(state.logger, "Invocation received"; "method" => &method);

    let handler = match state.registry.method_handler(&method).await {
        Some(handler) => handler,
        None => {
            return (StatusCode::NOT_FOUND, format!("No method named {}", method)).into_response();
        }
    };

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    let request = InvocationRequest {
        method: method.clone(),
        data: body.to_vec(),
        content_type,
    };

    match handler(request).await {
        Ok(response) => {
            ([(header::CONTENT_TYPE, response.content_type)], response.data).into_response()
        }
        Err(e) => {
            error!(state.logger, "Invocation handler failed"; "method" => &method, "error" => %e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn handle_actor_invoke(
    State(state): State<AppState>,
    Path((actor_type, actor_id, method)): Path<(String, String, String)>,
    body: Bytes,
) -> Response {
    debug!(state.logger, "Actor invocation received";
        "actor_type" => &actor_type,
        "actor_id" => &actor_id,
        "method" => &method
    );

    let handler = match state.registry.actor_handler(&actor_type).await {
        Some(handler) => handler,
        None => {
            return (
                StatusCode::NOT_FOUND,
                format!("No actor type named {}", actor_type),
            )
                .into_response();
        }
    };

    let invocation = ActorInvocation {
        actor_type: actor_type.clone(),
        actor_id,
        method,
        data: body.to_vec(),
    };

    match handler(invocation).await {
        Ok(data) => (StatusCode::OK, data).into_response(),
        Err(e) => {
            error!(state.logger, "Actor handler failed";
                "actor_type" => &actor_type,
                "error" => %e
            );
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slog::{o, Drain};

    fn create_test_logger() -> Logger {
        let decorator = slog_term::PlainDecorator::new(std::io::sink());
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        Logger::root(drain, o!())
    }

    #[tokio::test]
    async fn test_stop_before_start_is_harmless() {
        let server = HttpServer::new(create_test_logger());
        assert!(server.stop().await.is_ok());
        assert!(server.stop_listener().await.is_ok());
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let port = port_check::free_local_port().expect("Should find free port");
        let server = HttpServer::new(create_test_logger());

        server
            .start("127.0.0.1", &port.to_string())
            .await
            .expect("Should start");

        let second = server.start("127.0.0.1", &port.to_string()).await;
        assert!(matches!(second, Err(ServerError::Startup(_))));

        server.stop().await.expect("Should stop");
    }

    #[tokio::test]
    async fn test_invalid_address_is_startup_error() {
        let server = HttpServer::new(create_test_logger());
        let result = server.start("not a host", "50050").await;
        assert!(matches!(result, Err(ServerError::Startup(_))));
    }
}
