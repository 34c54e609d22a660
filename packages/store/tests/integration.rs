mod common;

use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{MemoryService, TOKEN};
use jsonstore::{JsonStore, Reply, StoreError};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
struct Player {
    name: String,
    coins: u32,
}

fn store(uri: &str) -> JsonStore {
    JsonStore::builder()
        .endpoint(uri)
        .token(TOKEN)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_put_then_get_round_trip() {
    let server = MockServer::start().await;
    let service = MemoryService::mount(&server).await;
    let uri = server.uri();

    let player = Player {
        name: "Alice".to_string(),
        coins: 10,
    };
    let sent = player.clone();

    let (put, got) = tokio::task::spawn_blocking(move || {
        let store = store(&uri);
        let put = store.put("players/alice", &sent).unwrap();
        let got = store.get("players/alice").unwrap();
        (put, got)
    })
    .await
    .unwrap();

    assert_eq!(put, Reply::Value(json!({"name": "Alice", "coins": 10})));
    assert_eq!(got.decode::<Player>().unwrap(), Some(player));
    assert_eq!(
        service.stored(&format!("/{TOKEN}/players/alice")),
        Some(json!({"name": "Alice", "coins": 10}))
    );
}

#[tokio::test]
async fn test_delete_removes_value() {
    let server = MockServer::start().await;
    MemoryService::mount(&server).await;
    let uri = server.uri();

    let (deleted, after) = tokio::task::spawn_blocking(move || {
        let store = store(&uri);
        store.put("scores", json!([1, 2, 3])).unwrap();
        let deleted = store.delete("scores").unwrap();
        let after = store.get("scores").unwrap();
        (deleted, after)
    })
    .await
    .unwrap();

    assert_eq!(deleted, Reply::Value(json!(true)));
    assert_eq!(after, Reply::NotFound);
    assert_eq!(after.into_legacy(), json!(false));
}

#[tokio::test]
async fn test_post_writes_value() {
    let server = MockServer::start().await;
    let service = MemoryService::mount(&server).await;
    let uri = server.uri();

    let reply = tokio::task::spawn_blocking(move || store(&uri).post("log", json!({"n": 1})).unwrap())
        .await
        .unwrap();

    assert_eq!(reply, Reply::Value(json!({"n": 1})));
    assert_eq!(service.stored(&format!("/{TOKEN}/log")), Some(json!({"n": 1})));
}

#[tokio::test]
async fn test_default_creates_missing_value() {
    let server = MockServer::start().await;
    MemoryService::mount(&server).await;
    let uri = server.uri();

    let (default, after) = tokio::task::spawn_blocking(move || {
        let store = store(&uri);
        let default = store.get_default("settings", json!({"music": true})).unwrap();
        let after = store.get("settings").unwrap();
        (default, after)
    })
    .await
    .unwrap();

    assert_eq!(default, Reply::Value(json!({"music": true})));
    assert_eq!(after, Reply::Value(json!({"music": true})));
}

#[tokio::test]
async fn test_default_preserves_existing_value() {
    let server = MockServer::start().await;
    MemoryService::mount(&server).await;
    let uri = server.uri();

    let (default, after) = tokio::task::spawn_blocking(move || {
        let store = store(&uri);
        store.put("settings", json!({"music": false})).unwrap();
        let default = store.get_default("settings", json!({"music": true})).unwrap();
        let after = store.get("settings").unwrap();
        (default, after)
    })
    .await
    .unwrap();

    assert_eq!(default, Reply::Value(json!({"music": false})));
    assert_eq!(after, Reply::Value(json!({"music": false})));
}

#[tokio::test]
async fn test_get_404_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{TOKEN}/missing")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let uri = server.uri();
    let reply = tokio::task::spawn_blocking(move || store(&uri).get("missing").unwrap())
        .await
        .unwrap();

    assert_eq!(reply, Reply::NotFound);
}

#[tokio::test]
async fn test_server_error_is_failure_reply() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("/{TOKEN}/broken")))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"ok": false, "error": "disk full"})),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let reply = tokio::task::spawn_blocking(move || store(&uri).put("broken", 1).unwrap())
        .await
        .unwrap();

    assert_eq!(
        reply,
        Reply::Failure("HTTP 500 Internal Server Error: disk full".to_string())
    );
    assert_eq!(
        reply.into_legacy(),
        json!("HTTP 500 Internal Server Error: disk full")
    );
}

#[tokio::test]
async fn test_default_does_not_write_after_failed_read() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let uri = server.uri();
    let reply = tokio::task::spawn_blocking(move || store(&uri).get_default("a", 1).unwrap())
        .await
        .unwrap();

    assert!(reply.is_failure());
}

#[tokio::test]
async fn test_ping_reachable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/{TOKEN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": null})))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let alive = tokio::task::spawn_blocking(move || store(&uri).ping().unwrap())
        .await
        .unwrap();

    assert!(alive);
}

#[tokio::test]
async fn test_ping_and_get_on_unreachable_endpoint() {
    // Nothing listens on port 1.
    let (alive, reply) = tokio::task::spawn_blocking(|| {
        let store = store("http://127.0.0.1:1");
        (store.ping().unwrap(), store.get("a").unwrap())
    })
    .await
    .unwrap();

    assert!(!alive);
    assert!(reply.is_failure());
}

#[tokio::test]
async fn test_destroyed_store_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let uri = server.uri();
    let results = tokio::task::spawn_blocking(move || {
        let store = store(&uri);
        store.destroy();
        vec![
            store.ping().map(|_| ()),
            store.get("a").map(|_| ()),
            store.put("a", 1).map(|_| ()),
            store.post("a", 1).map(|_| ()),
            store.delete("a").map(|_| ()),
            store.get_default("a", 1).map(|_| ()),
            store.get_async("a").map(|_| ()),
            store.get_default_async("a", 1).map(|_| ()),
        ]
    })
    .await
    .unwrap();

    assert!(results
        .iter()
        .all(|r| matches!(r, Err(StoreError::Destroyed))));
}

#[tokio::test]
async fn test_token_and_url() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let expected = uri.clone();

    let (url, token, full) = tokio::task::spawn_blocking(move || {
        let store = store(&format!("{uri}/"));
        (store.url().to_string(), store.token(false), store.token(true))
    })
    .await
    .unwrap();

    assert_eq!(url, expected);
    assert_eq!(token, TOKEN);
    assert_eq!(full, format!("{expected}/{TOKEN}"));
}
