//! Refresh events and the bus that carries them to downstream instances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::{MonitorError, Result};
use crate::service::ServiceId;

/// Default number of events a lagging subscriber may fall behind.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Tells the instances of a service to reload their configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshEvent {
    /// Identity of the process that raised the event.
    pub origin_service: String,

    /// Which services should refresh.
    pub destination_service: ServiceId,

    /// When the event was raised.
    pub timestamp: DateTime<Utc>,
}

impl RefreshEvent {
    /// Create a new refresh event.
    pub fn new(origin: impl Into<String>, destination: ServiceId) -> Self {
        Self {
            origin_service: origin.into(),
            destination_service: destination,
            timestamp: Utc::now(),
        }
    }

    /// Check if the service called `name` is addressed.
    pub fn is_for(&self, name: &str) -> bool {
        self.destination_service.matches(name)
    }
}

/// Transport for refresh events.
///
/// Delivery guarantees belong to the implementation.
pub trait RefreshBus: Send + Sync {
    /// Publish one event.
    fn publish(&self, event: RefreshEvent) -> Result<()>;
}

/// In-process bus over a tokio broadcast channel.
///
/// Every subscriber sees every event published after it subscribed.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<RefreshEvent>,
}

impl BroadcastBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

impl RefreshBus for BroadcastBus {
    fn publish(&self, event: RefreshEvent) -> Result<()> {
        self.tx
            .send(event)
            .map(|_| ())
            .map_err(|e| MonitorError::NoSubscribers(e.0.destination_service.to_string()))
    }
}
