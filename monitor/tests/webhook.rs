//! Integration tests for the `/monitor` webhook route.

use std::net::SocketAddr;
use std::sync::Arc;

use cloudcfg_monitor::{BroadcastBus, CompositeExtractor, PropertyPathEndpoint, routes};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::TcpListener;

/// Serve the webhook route on an ephemeral port.
async fn serve(prefix: &str) -> (SocketAddr, BroadcastBus) {
    let bus = BroadcastBus::default();
    let endpoint = Arc::new(
        PropertyPathEndpoint::new(
            Arc::new(CompositeExtractor::with_defaults()),
            Arc::new(bus.clone()),
        )
        .with_context_id("config-server:8888"),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::router(endpoint, prefix);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, bus)
}

#[tokio::test]
async fn test_json_path_notification() {
    let (addr, bus) = serve("").await;
    let mut rx = bus.subscribe();

    let services: Vec<String> = reqwest::Client::new()
        .post(format!("http://{addr}/monitor"))
        .json(&json!({"path": "application.yml"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(services, vec!["*"]);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.origin_service, "config-server:8888");
    assert!(event.is_for("orders"));
}

#[tokio::test]
async fn test_form_notification_with_prefix() {
    let (addr, _bus) = serve("/config").await;

    let services: Vec<String> = reqwest::Client::new()
        .post(format!("http://{addr}/config/monitor"))
        .form(&[
            ("path", "/foo/bar.properties"),
            ("path", "/application.properties"),
        ])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(services, vec!["bar", "*"]);
}

#[tokio::test]
async fn test_github_push() {
    let (addr, _bus) = serve("").await;

    let services: Vec<String> = reqwest::Client::new()
        .post(format!("http://{addr}/monitor"))
        .header("X-GitHub-Event", "push")
        .json(&json!({
            "commits": [
                {"added": [], "removed": [], "modified": ["orders.yml", "orders-dev.yml"]},
                {"added": ["orders.properties"], "removed": [], "modified": []}
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(services, vec!["orders", "orders-dev"]);
}

#[tokio::test]
async fn test_unrecognised_and_malformed_bodies() {
    let (addr, _bus) = serve("").await;
    let client = reqwest::Client::new();

    let unrecognised = client
        .post(format!("http://{addr}/monitor"))
        .json(&json!({"ref": "refs/heads/main"}))
        .send()
        .await
        .unwrap();
    assert!(unrecognised.status().is_success());
    assert_eq!(unrecognised.json::<Vec<String>>().await.unwrap(), Vec::<String>::new());

    let malformed = client
        .post(format!("http://{addr}/monitor"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(malformed.status().is_success());
    assert_eq!(malformed.json::<Vec<String>>().await.unwrap(), Vec::<String>::new());
}
