//! Watch service: per-directory registration and a non-blocking key queue.
//!
//! The monitor talks to the OS through [`WatchService`]; [`NotifyWatchService`]
//! is the production implementation on top of `notify`. Tests substitute
//! their own to control event delivery.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use indexmap::IndexMap;
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::error::{MonitorError, Result};
use crate::event::{ChangeEvent, WatchKey};

/// An open watch handle.
pub trait WatchService: Send {
    /// Register `dir` (non-recursively) for create and modify delivery.
    fn register(&mut self, dir: &Path) -> Result<()>;

    /// Take the next signalled key, or `None` if nothing is queued right now.
    /// Never waits for new events.
    fn poll(&mut self) -> Option<WatchKey>;

    /// Re-arm a key returned by [`WatchService::poll`].
    fn reset(&mut self, key: &WatchKey);

    /// Release the OS handle.
    fn close(&mut self) -> Result<()>;
}

/// Opens watch services. Called once per monitor start.
pub trait WatchBackend: Send + Sync {
    /// Open a new watch handle.
    fn open(&self) -> Result<Box<dyn WatchService>>;
}

/// Backend using the platform's recommended `notify` watcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyBackend;

impl WatchBackend for NotifyBackend {
    fn open(&self) -> Result<Box<dyn WatchService>> {
        Ok(Box::new(NotifyWatchService::new()?))
    }
}

/// [`WatchService`] backed by `notify`.
pub struct NotifyWatchService {
    /// Internal notify watcher; `None` once closed.
    watcher: Option<RecommendedWatcher>,

    /// Raw events from the notify thread.
    rx: mpsc::Receiver<notify::Result<notify::Event>>,

    /// Directories registered so far.
    registered: HashSet<PathBuf>,

    /// Undelivered events grouped by directory, in first-arrival order.
    pending: IndexMap<PathBuf, Vec<ChangeEvent>>,

    /// Keys handed out and not yet reset.
    signalled: HashSet<PathBuf>,
}

impl NotifyWatchService {
    /// Open a new notify watcher.
    pub fn new() -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx)?;

        Ok(Self {
            watcher: Some(watcher),
            rx,
            registered: HashSet::new(),
            pending: IndexMap::new(),
            signalled: HashSet::new(),
        })
    }

    fn drain_channel(&mut self) {
        while let Ok(res) = self.rx.try_recv() {
            match res {
                Ok(event) => {
                    for path in removed_paths(&event) {
                        self.forget(&path);
                    }
                    for (dir, change) in ChangeEvent::from_notify(event) {
                        let overflow = matches!(change, ChangeEvent::Overflow(_));
                        if !overflow && !self.registered.contains(&dir) {
                            continue;
                        }
                        self.pending.entry(dir).or_default().push(change);
                    }
                }
                Err(e) => warn!("Watch error: {e}"),
            }
        }
    }

    /// Drop `path` and everything below it from the registered set.
    ///
    /// The OS discards the watch of a deleted or moved directory, so a
    /// directory recreated under the same name must be registered again.
    fn forget(&mut self, path: &Path) {
        let stale: Vec<PathBuf> = self
            .registered
            .iter()
            .filter(|dir| dir.starts_with(path))
            .cloned()
            .collect();

        for dir in stale {
            debug!("unregistering: {}", dir.display());
            let unwatched = self.watcher.as_mut().map(|watcher| watcher.unwatch(&dir));
            if let Some(Err(e)) = unwatched {
                debug!("Stale watch on {}: {e}", dir.display());
            }
            self.registered.remove(&dir);
        }
    }
}

/// Paths a notify event takes away from the tree.
fn removed_paths(event: &notify::Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.clone()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.first().cloned().into_iter().collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => event
            .paths
            .iter()
            .filter(|path| !path.exists())
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

impl WatchService for NotifyWatchService {
    fn register(&mut self, dir: &Path) -> Result<()> {
        let watcher = self.watcher.as_mut().ok_or(MonitorError::WatchClosed)?;

        if self.registered.contains(dir) {
            return Ok(());
        }

        debug!("registering: {} for file creation events", dir.display());
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        self.registered.insert(dir.to_path_buf());
        Ok(())
    }

    fn poll(&mut self) -> Option<WatchKey> {
        if self.watcher.is_none() {
            return None;
        }

        self.drain_channel();

        let dir = self
            .pending
            .keys()
            .find(|dir| !self.signalled.contains(*dir))
            .cloned()?;
        let events = self.pending.shift_remove(&dir)?;
        self.signalled.insert(dir.clone());

        Some(WatchKey::new(dir, events))
    }

    fn reset(&mut self, key: &WatchKey) {
        self.signalled.remove(&key.dir);
    }

    fn close(&mut self) -> Result<()> {
        let watcher = self.watcher.take().ok_or(MonitorError::WatchClosed)?;
        drop(watcher);

        self.registered.clear();
        self.pending.clear();
        self.signalled.clear();
        Ok(())
    }
}
