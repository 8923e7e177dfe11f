//! Change events delivered by the watch service.

use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

/// A single entry in a watch key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// An entry was created, named relative to the key's directory.
    Created(PathBuf),

    /// An entry was modified, named relative to the key's directory.
    Modified(PathBuf),

    /// The OS dropped events. Carries a path only when the platform reliably
    /// names the affected subtree.
    Overflow(Option<PathBuf>),

    /// Anything else (removals, renames away). Logged and ignored.
    Other(String),
}

impl ChangeEvent {
    /// Split a notify event into `(watched directory, event)` pairs.
    ///
    /// Access events are dropped: walking a tree opens its directories,
    /// and those reads must not feed back into the next poll.
    pub fn from_notify(event: Event) -> Vec<(PathBuf, ChangeEvent)> {
        if event.need_rescan() {
            return vec![(PathBuf::new(), ChangeEvent::Overflow(None))];
        }

        let make: fn(PathBuf) -> ChangeEvent = match event.kind {
            EventKind::Access(_) => return Vec::new(),
            EventKind::Create(_) => ChangeEvent::Created,
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeEvent::Created,
            // FSEvents reports both halves of a rename this way; the half
            // that moved away no longer exists and is dropped on poll.
            EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => ChangeEvent::Created,
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                // paths = [from, to]; only the destination is a new entry.
                return event
                    .paths
                    .last()
                    .and_then(|path| split_entry(path.clone()))
                    .map(|(dir, name)| vec![(dir, ChangeEvent::Created(name))])
                    .unwrap_or_default();
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                return other_events(event.paths, "rename");
            }
            EventKind::Modify(_) => ChangeEvent::Modified,
            EventKind::Remove(_) => return other_events(event.paths, "remove"),
            EventKind::Any | EventKind::Other => return other_events(event.paths, "other"),
        };

        event
            .paths
            .into_iter()
            .filter_map(split_entry)
            .map(|(dir, name)| (dir, make(name)))
            .collect()
    }

    /// Short label for logging.
    pub fn kind(&self) -> &str {
        match self {
            Self::Created(_) => "create",
            Self::Modified(_) => "modify",
            Self::Overflow(_) => "overflow",
            Self::Other(kind) => kind,
        }
    }
}

/// The pending events of one registered directory.
///
/// A key handed out by [`crate::watch::WatchService::poll`] stays signalled
/// until it is reset; events arriving meanwhile are held back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchKey {
    /// The registered directory the events belong to.
    pub dir: PathBuf,

    /// Events in arrival order.
    pub events: Vec<ChangeEvent>,
}

impl WatchKey {
    /// Create a key for `dir`.
    pub fn new(dir: impl Into<PathBuf>, events: Vec<ChangeEvent>) -> Self {
        Self {
            dir: dir.into(),
            events,
        }
    }
}

fn split_entry(path: PathBuf) -> Option<(PathBuf, PathBuf)> {
    let name = PathBuf::from(path.file_name()?);
    let dir = path.parent()?.to_path_buf();
    Some((dir, name))
}

fn other_events(paths: Vec<PathBuf>, kind: &str) -> Vec<(PathBuf, ChangeEvent)> {
    paths
        .into_iter()
        .filter_map(split_entry)
        .map(|(dir, _)| (dir, ChangeEvent::Other(kind.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, Flag, RemoveKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_event() {
        let event = Event::new(EventKind::Create(CreateKind::File)).add_path("/repo/app.yml".into());

        assert_eq!(
            ChangeEvent::from_notify(event),
            vec![(
                PathBuf::from("/repo"),
                ChangeEvent::Created(PathBuf::from("app.yml"))
            )]
        );
    }

    #[test]
    fn test_modify_event() {
        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path("/repo/sub/foo.properties".into());

        assert_eq!(
            ChangeEvent::from_notify(event),
            vec![(
                PathBuf::from("/repo/sub"),
                ChangeEvent::Modified(PathBuf::from("foo.properties"))
            )]
        );
    }

    #[test]
    fn test_rescan_is_overflow() {
        let event = Event::new(EventKind::Other).set_flag(Flag::Rescan);

        assert_eq!(
            ChangeEvent::from_notify(event),
            vec![(PathBuf::new(), ChangeEvent::Overflow(None))]
        );
    }

    #[test]
    fn test_remove_is_other() {
        let event = Event::new(EventKind::Remove(RemoveKind::File)).add_path("/repo/gone.yml".into());
        let events = ChangeEvent::from_notify(event);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1.kind(), "remove");
    }

    #[test]
    fn test_unspecified_rename_is_created() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any)))
            .add_path("/repo/orders.yml".into());

        assert_eq!(
            ChangeEvent::from_notify(event),
            vec![(
                PathBuf::from("/repo"),
                ChangeEvent::Created(PathBuf::from("orders.yml"))
            )]
        );
    }

    #[test]
    fn test_rename_from_is_other() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path("/repo/orders.yml".into());
        let events = ChangeEvent::from_notify(event);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1.kind(), "rename");
    }

    #[test]
    fn test_rename_both_keeps_destination() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path("/repo/old.yml".into())
            .add_path("/repo/new.yml".into());

        assert_eq!(
            ChangeEvent::from_notify(event),
            vec![(
                PathBuf::from("/repo"),
                ChangeEvent::Created(PathBuf::from("new.yml"))
            )]
        );
    }
}
