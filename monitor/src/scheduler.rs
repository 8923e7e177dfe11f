//! Fixed-rate polling of the file monitor.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use indexmap::IndexSet;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::endpoint::PropertyPathEndpoint;
use crate::service::ServiceId;
use crate::watcher::FileMonitor;

/// Poll `monitor` once and forward the changed files to `endpoint`.
///
/// All files of one cycle go out as a single notification, so each service
/// is refreshed at most once per cycle.
pub fn poll_once(monitor: &FileMonitor, endpoint: &PropertyPathEndpoint) -> IndexSet<ServiceId> {
    let files = monitor.files_from_events();
    if files.is_empty() {
        return IndexSet::new();
    }

    debug!("{} changed files", files.len());
    let paths = files
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect();
    endpoint.notify_by_form(&HeaderMap::new(), paths)
}

/// Spawn the poll loop. Each poll runs on the blocking pool and finishes
/// before the next tick is awaited.
pub fn spawn_poller(
    monitor: Arc<FileMonitor>,
    endpoint: Arc<PropertyPathEndpoint>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        info!("Polling file monitor every {period:?}");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let monitor = monitor.clone();
            let endpoint = endpoint.clone();
            if let Err(e) =
                tokio::task::spawn_blocking(move || poll_once(&monitor, &endpoint)).await
            {
                error!("File monitor poll failed: {e}");
            }
        }

        debug!("File monitor poller stopped");
    })
}
