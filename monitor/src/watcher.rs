//! File monitor: owns the watch handle and aggregates changed files.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexSet;
use tracing::{debug, error, info};

use crate::config::{ExcludePatterns, MonitorConfig, RepositoryConfig};
use crate::event::ChangeEvent;
use crate::resolver::resolve_watch_roots;
use crate::walker::walk_directory;
use crate::watch::{NotifyBackend, WatchBackend, WatchService};

/// Watches the local repository and reports the files that changed.
///
/// Lifecycle: `new` → `start` → `files_from_events`* → `stop`. Start and
/// stop are serialised by one lock and are idempotent.
pub struct FileMonitor {
    /// Repository to derive watch roots from.
    repository: RepositoryConfig,

    /// Files that never count as changed.
    excludes: ExcludePatterns,

    /// Opens the watch handle on start.
    backend: Arc<dyn WatchBackend>,

    /// Running flag, roots and the handle itself.
    state: Mutex<MonitorState>,
}

#[derive(Default)]
struct MonitorState {
    running: bool,
    roots: Vec<PathBuf>,
    service: Option<Box<dyn WatchService>>,
}

impl FileMonitor {
    /// Create a stopped monitor using the platform's notify backend.
    pub fn new(repository: RepositoryConfig, config: &MonitorConfig) -> Self {
        Self {
            repository,
            excludes: ExcludePatterns::from(config),
            backend: Arc::new(NotifyBackend),
            state: Mutex::new(MonitorState::default()),
        }
    }

    /// Use a different watch backend.
    pub fn with_backend(mut self, backend: Arc<dyn WatchBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Resolve the roots, open a watch handle and register every directory.
    ///
    /// If the handle cannot be opened the monitor still counts as running,
    /// but polls yield nothing.
    pub fn start(&self) {
        let mut state = self.lock_state();
        if state.running {
            debug!("File monitor already running");
            return;
        }

        let roots = resolve_watch_roots(&self.repository);
        if roots.is_empty() {
            info!("No local repository to watch");
        } else {
            match self.backend.open() {
                Ok(mut service) => {
                    for root in &roots {
                        let files = walk_directory(service.as_mut(), root, &self.excludes);
                        debug!("Watching {} ({} files)", root.display(), files.len());
                    }
                    state.service = Some(service);
                }
                Err(e) => error!("Failed to open watch service: {e}"),
            }
        }

        info!("File monitor started for {roots:?}");
        state.roots = roots;
        state.running = true;
    }

    /// Release the watch handle. A no-op when not running.
    pub fn stop(&self) {
        let mut state = self.lock_state();
        if !state.running {
            return;
        }

        if let Some(mut service) = state.service.take() {
            if let Err(e) = service.close() {
                error!("Failed to close watcher for {:?}: {e}", state.roots);
            }
        }

        state.roots.clear();
        state.running = false;
        info!("File monitor stopped");
    }

    /// Check if the monitor is running.
    pub fn is_running(&self) -> bool {
        self.lock_state().running
    }

    /// Roots being watched; empty when stopped.
    pub fn roots(&self) -> Vec<PathBuf> {
        self.lock_state().roots.clone()
    }

    /// Drain every queued watch key and return the changed files.
    ///
    /// Never blocks waiting for events and never fails: paths that cannot
    /// be read contribute nothing.
    pub fn files_from_events(&self) -> IndexSet<PathBuf> {
        let mut state = self.lock_state();
        let MonitorState { roots, service, .. } = &mut *state;
        let Some(service) = service.as_mut() else {
            return IndexSet::new();
        };

        let mut files = IndexSet::new();
        while let Some(key) = service.poll() {
            for event in &key.events {
                match event {
                    ChangeEvent::Created(name) | ChangeEvent::Modified(name) => {
                        let path = key.dir.join(name);
                        if path.is_dir() {
                            files.extend(walk_directory(service.as_mut(), &path, &self.excludes));
                        } else if !path.is_file() {
                            debug!("Watch Event: {}: {} is gone", event.kind(), path.display());
                        } else if self.excludes.should_exclude(&path) {
                            debug!("Watch Event: {}: {} excluded", event.kind(), path.display());
                        } else {
                            debug!("Watch Event: {}: {}", event.kind(), path.display());
                            files.insert(path);
                        }
                    }
                    ChangeEvent::Overflow(Some(path)) => {
                        debug!("Watch Event: overflow: context: {}", path.display());
                        files.extend(walk_directory(service.as_mut(), path, &self.excludes));
                    }
                    ChangeEvent::Overflow(None) => {
                        debug!("Watch Event: overflow: re-walking {} roots", roots.len());
                        for root in roots.iter() {
                            files.extend(walk_directory(service.as_mut(), root, &self.excludes));
                        }
                    }
                    ChangeEvent::Other(kind) => {
                        debug!("Watch Event: {kind}: context: {}", key.dir.display());
                    }
                }
            }
            service.reset(&key);
        }

        files
    }

    fn lock_state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for FileMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
