//! Recursive directory walk that registers every directory it enters.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tracing::{error, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::{ExcludePatterns, is_vcs_metadata, is_vcs_metadata_name};
use crate::error::Result;
use crate::watch::WatchService;

/// Walk `root`, registering each directory before any of its children are
/// visited, and return the regular files found in visit order.
///
/// Version-control metadata directories are neither entered nor registered,
/// including when `root` itself lies inside one.
/// Files matching `excludes` are left out of the result. A root that cannot
/// be walked is logged and yields no files.
pub fn walk_directory(
    service: &mut dyn WatchService,
    root: &Path,
    excludes: &ExcludePatterns,
) -> IndexSet<PathBuf> {
    match try_walk(service, root, excludes) {
        Ok(files) => files,
        Err(e) => {
            error!("Failed to walk directory: {}: {e}", root.display());
            IndexSet::new()
        }
    }
}

fn try_walk(
    service: &mut dyn WatchService,
    root: &Path,
    excludes: &ExcludePatterns,
) -> Result<IndexSet<PathBuf>> {
    let mut files = IndexSet::new();
    if is_vcs_metadata(root) {
        return Ok(files);
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_vcs_dir(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Below the root, skip the unreadable entry and keep going.
            Err(e) if e.depth() > 0 => {
                warn!("Skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if entry.file_type().is_dir() {
            service.register(entry.path())?;
        } else if is_regular_file(&entry) && !excludes.should_exclude(entry.path()) {
            files.insert(entry.into_path());
        }
    }

    Ok(files)
}

fn is_vcs_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && is_vcs_metadata_name(entry.file_name())
}

fn is_regular_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}
