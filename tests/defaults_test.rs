//! Default resolution and ambient bus behavior.
//!
//! Kept in its own test binary: the ambient bus is process-wide state, and
//! these assertions depend on the order of publications within the process.

use daprside::{ambient, CommunicationProtocol, DaprServer, ServerConfig};

#[tokio::test]
async fn test_defaults_then_ambient_last_write_wins() {
    // Fresh process: nothing published yet, so defaults resolve statically
    let config = ServerConfig::default();
    assert_eq!(config.server_host, "127.0.0.1");
    assert_eq!(config.server_port, "50050");
    assert_eq!(config.dapr_host, "127.0.0.1");
    assert_eq!(config.dapr_port, "50051");
    assert_eq!(config.protocol, CommunicationProtocol::Http);
    assert!(config.client_options.is_keep_alive);

    // Default construction selects the HTTP arm
    let server = DaprServer::new(config).expect("Default construction should succeed");
    assert_eq!(server.protocol(), CommunicationProtocol::Http);
    assert_eq!(server.server_port(), "50050");
    assert_eq!(server.dapr_port(), "50051");

    // Construction published the resolved ports
    assert_eq!(ambient::server_port(), Some("50050".to_string()));
    assert_eq!(ambient::sidecar_port(), Some("50051".to_string()));

    // A later default config discovers the published port
    let rediscovered = ServerConfig::default();
    assert_eq!(rediscovered.server_port, "50050");

    // Two constructions with different ports: the ambient channel shows only
    // the most recent value. This documents the race, it does not hide it.
    let _first = DaprServer::new(ServerConfig::new().with_server_port("6001"))
        .expect("Should construct");
    let _second = DaprServer::new(ServerConfig::new().with_server_port("6002"))
        .expect("Should construct");

    assert_eq!(ambient::server_port(), Some("6002".to_string()));
}
