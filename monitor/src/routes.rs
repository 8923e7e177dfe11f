//! HTTP route for repository webhooks.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use axum::Json;
use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use tracing::warn;

use crate::endpoint::PropertyPathEndpoint;
use crate::service::ServiceId;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Router serving `POST {prefix}/monitor`.
pub fn router(endpoint: Arc<PropertyPathEndpoint>, prefix: &str) -> Router {
    Router::new()
        .route(&monitor_path(prefix), post(notify))
        .with_state(endpoint)
}

/// Normalise `prefix` and append `/monitor`.
pub fn monitor_path(prefix: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        "/monitor".to_string()
    } else {
        format!("/{prefix}/monitor")
    }
}

/// Accepts a JSON object or a form with repeated `path` fields. Bodies that
/// cannot be parsed count as unrecognised and produce `[]`.
async fn notify(
    State(endpoint): State<Arc<PropertyPathEndpoint>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Vec<ServiceId>> {
    let services = if is_form(&headers) {
        let paths = url::form_urlencoded::parse(&body)
            .filter(|(key, _)| key == "path")
            .map(|(_, value)| value.into_owned())
            .collect();
        endpoint.notify_by_form(&headers, paths)
    } else {
        match parse_json_body(&body) {
            Some(map) => endpoint.notify_by_path(&headers, &map),
            None => Default::default(),
        }
    };

    Json(services.into_iter().collect())
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE))
}

fn parse_json_body(body: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            warn!("Ignoring webhook body that is not a JSON object: {other}");
            None
        }
        Err(e) => {
            warn!("Ignoring malformed webhook body: {e}");
            None
        }
    }
}
