//! Ambient configuration bus.
//!
//! A process-wide key→string map used to publish resolved port values so
//! collaborators constructed later (or in unrelated call paths) can discover
//! them without explicit parameter passing.
//!
//! The bus is deliberately last-write-wins: if two servers are constructed in
//! the same process with different ports, readers observe whichever was
//! published most recently. Components inside this crate never read the bus
//! after construction; they receive explicit references instead. The bus
//! exists for external collaborators that have no other discovery channel.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

/// Key under which the resolved application server port is published.
pub const SERVER_PORT_KEY: &str = "DAPR_SERVER_PORT";

/// Key under which the resolved sidecar port is published.
pub const CLIENT_PORT_KEY: &str = "DAPR_CLIENT_PORT";

static BUS: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn bus() -> &'static RwLock<HashMap<String, String>> {
    BUS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Publish a value under the given key, replacing any previous value.
pub fn publish(key: &str, value: &str) {
    let mut map = bus().write().unwrap_or_else(|e| e.into_inner());
    map.insert(key.to_string(), value.to_string());
}

/// Read the most recently published value for the given key.
pub fn get(key: &str) -> Option<String> {
    let map = bus().read().unwrap_or_else(|e| e.into_inner());
    map.get(key).cloned()
}

/// The most recently published application server port, if any.
pub fn server_port() -> Option<String> {
    get(SERVER_PORT_KEY)
}

/// The most recently published sidecar port, if any.
pub fn sidecar_port() -> Option<String> {
    get(CLIENT_PORT_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_get() {
        publish("test.ambient.key", "hello");
        assert_eq!(get("test.ambient.key"), Some("hello".to_string()));
        assert_eq!(get("test.ambient.missing"), None);
    }

    #[test]
    fn test_last_write_wins() {
        publish("test.ambient.race", "first");
        publish("test.ambient.race", "second");
        assert_eq!(get("test.ambient.race"), Some("second".to_string()));
    }
}
