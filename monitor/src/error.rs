//! Error types for the config monitor.

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur while watching files or publishing refreshes.
///
/// None of these escape the monitor's public entry points: they are logged
/// and the affected path, cycle or request contributes nothing.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// A repository location that does not map to a local directory.
    #[error("cannot resolve location: {0}")]
    UnresolvableLocation(String),

    /// The watch service has already been closed.
    #[error("watch service is closed")]
    WatchClosed,

    /// Nobody is listening on the refresh bus.
    #[error("no subscribers for refresh event to {0}")]
    NoSubscribers(String),

    /// Notify error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
