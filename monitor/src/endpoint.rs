//! Maps property path notifications onto refresh events.

use std::sync::Arc;

use http::HeaderMap;
use indexmap::IndexSet;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::bus::{RefreshBus, RefreshEvent};
use crate::extractor::NotificationExtractor;
use crate::service::ServiceId;

/// Entry point for webhook and file-monitor notifications.
///
/// Holds no mutable state: concurrent calls are independent.
pub struct PropertyPathEndpoint {
    /// Payload parser.
    extractor: Arc<dyn NotificationExtractor>,

    /// Where refresh events go.
    bus: Arc<dyn RefreshBus>,

    /// Identity stamped on every event this process raises.
    context_id: String,
}

impl PropertyPathEndpoint {
    /// Create an endpoint with a random context id.
    pub fn new(extractor: Arc<dyn NotificationExtractor>, bus: Arc<dyn RefreshBus>) -> Self {
        Self {
            extractor,
            bus,
            context_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Use a fixed context id.
    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = context_id.into();
        self
    }

    /// The identity stamped on published events.
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Publish one refresh per service named by the payload's paths.
    ///
    /// Returns the services in first-seen order; empty when the payload is
    /// not recognised.
    pub fn notify_by_path(
        &self,
        headers: &HeaderMap,
        body: &Map<String, Value>,
    ) -> IndexSet<ServiceId> {
        let Some(notification) = self.extractor.extract(headers, body) else {
            debug!("No property paths found in notification");
            return IndexSet::new();
        };

        let services: IndexSet<ServiceId> = notification
            .paths()
            .iter()
            .map(String::as_str)
            .filter_map(ServiceId::from_path)
            .collect();

        for service in &services {
            info!("Refresh for: {service}");
            let event = RefreshEvent::new(self.context_id.clone(), service.clone());
            if let Err(e) = self.bus.publish(event) {
                debug!("Refresh event not delivered: {e}");
            }
        }

        services
    }

    /// Form-encoded variant: a flat list of paths.
    pub fn notify_by_form(&self, headers: &HeaderMap, paths: Vec<String>) -> IndexSet<ServiceId> {
        let mut body = Map::new();
        body.insert(
            "path".to_string(),
            Value::Array(paths.into_iter().map(Value::String).collect()),
        );
        self.notify_by_path(headers, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BroadcastBus;
    use crate::extractor::{CompositeExtractor, PathExtractor};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn endpoint(extractor: CompositeExtractor) -> (PropertyPathEndpoint, BroadcastBus) {
        let bus = BroadcastBus::default();
        let endpoint = PropertyPathEndpoint::new(Arc::new(extractor), Arc::new(bus.clone()))
            .with_context_id("config-server");
        (endpoint, bus)
    }

    fn path_endpoint() -> (PropertyPathEndpoint, BroadcastBus) {
        endpoint(CompositeExtractor::new(Vec::new()).push(PathExtractor))
    }

    fn as_strings(services: &IndexSet<ServiceId>) -> Vec<&str> {
        services.iter().map(ServiceId::as_str).collect()
    }

    #[test]
    fn test_notify_all() {
        let (endpoint, _bus) = path_endpoint();
        let body = json!({"path": "application.yml"});

        let services = endpoint.notify_by_path(&HeaderMap::new(), body.as_object().unwrap());

        assert_eq!(as_strings(&services), vec!["*"]);
    }

    #[test]
    fn test_notify_several_keeps_order() {
        let (endpoint, _bus) = path_endpoint();
        let paths = vec![
            "/foo/bar.properties".to_string(),
            "/application.properties".to_string(),
        ];

        let services = endpoint.notify_by_form(&HeaderMap::new(), paths);

        assert_eq!(as_strings(&services), vec!["bar", "*"]);
    }

    #[test]
    fn test_notify_by_form_empty() {
        let (endpoint, _bus) = path_endpoint();

        assert!(endpoint.notify_by_form(&HeaderMap::new(), Vec::new()).is_empty());
    }

    #[test]
    fn test_unrecognised_payload_publishes_nothing() {
        let (endpoint, bus) = endpoint(CompositeExtractor::new(Vec::new()));
        let mut rx = bus.subscribe();
        let body = json!({"path": "application.yml"});

        let services = endpoint.notify_by_path(&HeaderMap::new(), body.as_object().unwrap());

        assert!(services.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_one_event_per_distinct_service() {
        let (endpoint, bus) = path_endpoint();
        let mut rx = bus.subscribe();
        let paths = vec![
            "/repo/orders.yml".to_string(),
            "/repo/orders-dev/orders.properties".to_string(),
            "/repo/application.yml".to_string(),
            "/repo/application-dev.yml".to_string(),
        ];

        endpoint.notify_by_form(&HeaderMap::new(), paths);

        let mut destinations = Vec::new();
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.origin_service, "config-server");
            destinations.push(event.destination_service.to_string());
        }
        assert_eq!(destinations, vec!["orders", "*", "application-dev"]);
    }

    #[test]
    fn test_random_context_id() {
        let bus: Arc<dyn RefreshBus> = Arc::new(BroadcastBus::default());
        let a = PropertyPathEndpoint::new(Arc::new(PathExtractor), bus.clone());
        let b = PropertyPathEndpoint::new(Arc::new(PathExtractor), bus);

        assert_ne!(a.context_id(), b.context_id());
    }
}
