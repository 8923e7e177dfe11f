//! # Config Monitor
//!
//! Detects changes to the config server's property files and tells the
//! affected services to refresh.
//!
//! ## Features
//!
//! - **File Monitoring**: Watch a local git checkout or native search locations
//! - **Webhooks**: Accept GitHub, GitLab, Bitbucket and plain path notifications
//! - **Refresh Events**: One event per affected service on the refresh bus
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Config Monitor                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  RepositoryConfig ──► FileMonitor ──► poll_once ─┐              │
//! │                          │                       ▼              │
//! │                    WatchService        PropertyPathEndpoint ──► RefreshBus
//! │                                                  ▲              │
//! │  POST /monitor ──► NotificationExtractor ────────┘              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod bus;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod extractor;
pub mod resolver;
pub mod routes;
pub mod scheduler;
pub mod service;
pub mod walker;
pub mod watch;
pub mod watcher;

pub use bus::{BroadcastBus, RefreshBus, RefreshEvent};
pub use config::{ExcludePatterns, GitRepository, MonitorConfig, NativeRepository, RepositoryConfig};
pub use endpoint::PropertyPathEndpoint;
pub use error::{MonitorError, Result};
pub use event::{ChangeEvent, WatchKey};
pub use extractor::{
    BitbucketExtractor, CompositeExtractor, GithubExtractor, GitlabExtractor, NotificationExtractor,
    PathExtractor, PropertyPathNotification,
};
pub use resolver::resolve_watch_roots;
pub use scheduler::{poll_once, spawn_poller};
pub use service::ServiceId;
pub use watch::{NotifyBackend, NotifyWatchService, WatchBackend, WatchService};
pub use watcher::FileMonitor;
