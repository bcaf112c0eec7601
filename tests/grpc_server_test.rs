use daprside::server::grpc::proto::app_callback_client::AppCallbackClient;
use daprside::server::grpc::proto::{
    topic_event_response::TopicEventResponseStatus, InvokeRequest, ListRegisteredActorsRequest,
    ListTopicSubscriptionsRequest, TopicEventRequest,
};
use daprside::{
    actor_handler, method_handler, topic_handler, CommunicationProtocol, DaprServer,
    InvocationResponse, ServerConfig,
};
use tokio::time::{sleep, Duration};

fn free_port() -> u16 {
    port_check::free_local_port().expect("Should find free port")
}

#[tokio::test]
async fn test_grpc_server_serves_callback_surface() {
    let port = free_port();
    let config = ServerConfig::new()
        .with_server_port(port.to_string())
        .with_dapr_port("50051")
        .with_protocol(CommunicationProtocol::Grpc);

    let server = DaprServer::new(config).expect("Construction should succeed");

    server
        .pubsub()
        .subscribe("pubsub", "orders", topic_handler(|_event| async { Ok(()) }))
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

    server
        .actor()
        .register_actor("Counter", actor_handler(|_invocation| async { Ok(Vec::new()) }))
        .await
        .expect("Should register actor");

    server.start().await.expect("Should start");
    sleep(Duration::from_millis(100)).await;

    let mut client = AppCallbackClient::connect(format!("http://127.0.0.1:{}", port))
        .await
        .expect("Should connect to gRPC server");

    // Subscription listing
    let subscriptions = client
        .list_topic_subscriptions(ListTopicSubscriptionsRequest {})
        .await
        .expect("Listing should succeed")
        .into_inner()
        .subscriptions;
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].pubsub_name, "pubsub");
    assert_eq!(subscriptions[0].topic, "orders");

    // Topic event delivery
    let status = client
        .on_topic_event(TopicEventRequest {
            id: "evt-1".to_string(),
            pubsub_name: "pubsub".to_string(),
            topic: "orders".to_string(),
            data: serde_json::to_vec(&serde_json::json!({ "order": 42 }))
                .expect("Should serialize"),
            data_content_type: "application/json".to_string(),
        })
        .await
        .expect("Delivery should succeed")
        .into_inner()
        .status;
    assert_eq!(status, TopicEventResponseStatus::Success as i32);

    // Unknown topic is NOT_FOUND, not a crash
    let unknown = client
        .on_topic_event(TopicEventRequest {
            id: "evt-2".to_string(),
            pubsub_name: "pubsub".to_string(),
            topic: "unknown".to_string(),
            data: Vec::new(),
            data_content_type: String::new(),
        })
        .await;
    assert_eq!(unknown.unwrap_err().code(), tonic::Code::NotFound);

    // Method invocation round-trips the payload
    let echoed = client
        .on_invoke(InvokeRequest {
            method: "echo".to_string(),
            data: b"hello sidecar".to_vec(),
            content_type: "text/plain".to_string(),
        })
        .await
        .expect("Invocation should succeed")
        .into_inner();
    assert_eq!(echoed.data, b"hello sidecar".to_vec());
    assert_eq!(echoed.content_type, "text/plain");

    // Hosted actor types
    let actors = client
        .list_registered_actors(ListRegisteredActorsRequest {})
        .await
        .expect("Listing should succeed")
        .into_inner()
        .actor_types;
    assert_eq!(actors, vec!["Counter".to_string()]);

    server.stop().await.expect("Should stop");
}

#[tokio::test]
async fn test_grpc_stop_server_tears_down_listener() {
    let port = free_port();
    let config = ServerConfig::new()
        .with_server_port(port.to_string())
        .with_dapr_port("50051")
        .with_protocol(CommunicationProtocol::Grpc);

    let server = DaprServer::new(config).expect("Construction should succeed");
    server.start().await.expect("Should start");
    sleep(Duration::from_millis(100)).await;

    server.stop_server().await.expect("Should stop listener");
    sleep(Duration::from_millis(100)).await;

    let result = AppCallbackClient::connect(format!("http://127.0.0.1:{}", port)).await;
    assert!(result.is_err());
}
