//! Resolves repository configuration into local directories to watch.

use std::path::PathBuf;

use indexmap::IndexSet;
use tracing::{debug, error};
use url::Url;

use crate::config::RepositoryConfig;
use crate::error::{MonitorError, Result};

/// Directories to watch for `repository`, in configuration order.
///
/// A git repository with a `file:` URI wins and is watched alone. Otherwise
/// every existing native search location is watched, canonicalised and
/// deduplicated. Anything else resolves to nothing.
pub fn resolve_watch_roots(repository: &RepositoryConfig) -> Vec<PathBuf> {
    if let Some(git) = &repository.git {
        if git.uri.starts_with("file:") {
            match resolve_location(&git.uri)
                .and_then(|p| std::path::absolute(p).map_err(MonitorError::from))
            {
                Ok(path) => return vec![path],
                Err(e) => error!("Cannot resolve URI for path: {}: {e}", git.uri),
            }
        } else {
            debug!("Git repository {} is not local, nothing to watch", git.uri);
        }
    }

    let Some(native) = &repository.native else {
        return Vec::new();
    };

    let mut roots = IndexSet::new();
    for location in &native.search_locations {
        let path = match resolve_location(location) {
            Ok(path) => path,
            Err(e) => {
                error!("Cannot resolve URI for path: {location}: {e}");
                continue;
            }
        };

        if !path.exists() {
            debug!("Search location {location} does not exist, skipping");
            continue;
        }

        match dunce::canonicalize(&path) {
            Ok(path) => {
                roots.insert(path);
            }
            Err(e) => error!("Cannot resolve URI for path: {location}: {e}"),
        }
    }

    roots.into_iter().collect()
}

/// Map a location string to a filesystem path.
///
/// Accepts `file:///absolute` URLs, `file:relative/path` and bare paths.
/// Other schemes and `{placeholder}` templates have no single local
/// directory and fail.
pub fn resolve_location(location: &str) -> Result<PathBuf> {
    let unresolvable = || MonitorError::UnresolvableLocation(location.to_string());

    if location.contains('{') {
        return Err(unresolvable());
    }

    if let Some(rest) = location.strip_prefix("file:") {
        if rest.starts_with("//") {
            let url = Url::parse(location).map_err(|_| unresolvable())?;
            return url.to_file_path().map_err(|()| unresolvable());
        }
        return Ok(PathBuf::from(rest));
    }

    if has_scheme(location) {
        return Err(unresolvable());
    }

    Ok(PathBuf::from(location))
}

/// `classpath:`, `https:` and friends. Single letters are Windows drives.
fn has_scheme(location: &str) -> bool {
    location.split_once(':').is_some_and(|(scheme, _)| {
        scheme.len() > 1
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}
