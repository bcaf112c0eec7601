use daprside::{
    method_handler, topic_handler, CommunicationProtocol, DaprServer, InvocationResponse,
    LifecycleState, ServerConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

fn free_port() -> u16 {
    port_check::free_local_port().expect("Should find free port")
}

#[tokio::test]
async fn test_http_server_serves_callback_surface() {
    let port = free_port();
    let config = ServerConfig::new()
        .with_server_port(port.to_string())
        .with_dapr_port("50051")
        .with_protocol(CommunicationProtocol::Http);

    let server = DaprServer::new(config).expect("Construction should succeed");

    let deliveries = Arc::new(AtomicUsize::new(0));
    let counter = deliveries.clone();
    server
        .pubsub()
        .subscribe(
            "pubsub",
            "orders",
            topic_handler(move |_event| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        )
        .await
        .expect("Should subscribe");

    server
        .invoker()
        .listen(
            "echo",
            method_handler(|request| async move {
                Ok(InvocationResponse {
                    data: request.data,
                    content_type: request.content_type,
                })
            }),
        )
        .await
        .expect("Should register method");

    server.start().await.expect("Should start");
    sleep(Duration::from_millis(100)).await;

    let base = format!("http://127.0.0.1:{}", port);
    let http = reqwest::Client::new();

    // Health
    let health = http
        .get(format!("{}/healthz", base))
        .send()
        .await
        .expect("Health request should succeed");
    assert!(health.status().is_success());

    // Subscription listing the sidecar polls
    let subscriptions: serde_json::Value = http
        .get(format!("{}/dapr/subscribe", base))
        .send()
        .await
        .expect("Subscribe listing should succeed")
        .json()
        .await
        .expect("Should be JSON");
    let listed = subscriptions.as_array().expect("Should be an array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["pubsubname"], "pubsub");
    assert_eq!(listed[0]["topic"], "orders");
    assert_eq!(listed[0]["route"], "/events/pubsub/orders");

    // Topic event delivery on the listed route
    let delivery = http
        .post(format!("{}/events/pubsub/orders", base))
        .json(&serde_json::json!({ "id": "evt-1", "data": { "order": 42 } }))
        .send()
        .await
        .expect("Event delivery should succeed");
    assert!(delivery.status().is_success());
    assert_eq!(deliveries.load(Ordering::SeqCst), 1);

    // Event for an unknown topic is a 404, not a crash
    let unknown = http
        .post(format!("{}/events/pubsub/unknown", base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .expect("Request should complete");
    assert_eq!(unknown.status().as_u16(), 404);

    // Method invocation round-trips the payload
    let echoed = http
        .post(format!("{}/invoke/echo", base))
        .header("content-type", "text/plain")
        .body("hello sidecar")
        .send()
        .await
        .expect("Invocation should succeed");
    assert!(echoed.status().is_success());
    assert_eq!(echoed.text().await.expect("Should have body"), "hello sidecar");

    server.stop().await.expect("Should stop");
    assert_eq!(server.lifecycle_state().await, LifecycleState::Stopped);
}

#[tokio::test]
async fn test_http_stop_server_tears_down_listener() {
    let port = free_port();
    let config = ServerConfig::new()
        .with_server_port(port.to_string())
        .with_dapr_port("50051")
        .with_protocol(CommunicationProtocol::Http);

    let server = DaprServer::new(config).expect("Construction should succeed");
    server.start().await.expect("Should start");
    sleep(Duration::from_millis(100)).await;

    server.stop_server().await.expect("Should stop listener");
    sleep(Duration::from_millis(100)).await;

    // The port no longer accepts connections
    let result = reqwest::Client::new()
        .get(format!("http://127.0.0.1:{}/healthz", port))
        .timeout(Duration::from_millis(500))
        .send()
        .await;
    assert!(result.is_err());
}
