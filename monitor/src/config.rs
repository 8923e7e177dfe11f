//! Configuration types for the file monitor.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wildmatch::WildMatch;

/// Default interval between two polls of the watch queue.
pub const DEFAULT_FIXED_DELAY_MS: u64 = 5000;

/// Directory names that hold version-control metadata.
const VCS_METADATA_DIRS: [&str; 3] = [".git", ".svn", ".hg"];

/// Settings for the file monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Milliseconds between two polls of the watch queue.
    pub fixed_delay_ms: u64,

    /// File name globs that never trigger a refresh.
    pub excludes: Vec<String>,
}

impl MonitorConfig {
    /// Set the poll interval.
    pub fn with_fixed_delay(mut self, delay: Duration) -> Self {
        self.fixed_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Add an exclude pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// The poll interval as a [`Duration`].
    pub fn fixed_delay(&self) -> Duration {
        Duration::from_millis(self.fixed_delay_ms)
    }

    /// Dotfiles and editor lock files (`#foo`, `foo#`).
    pub fn default_excludes() -> Vec<String> {
        vec![".*".to_string(), "#*".to_string(), "*#".to_string()]
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            fixed_delay_ms: DEFAULT_FIXED_DELAY_MS,
            excludes: Self::default_excludes(),
        }
    }
}

/// Where the config server reads its property sources from.
///
/// Only local repositories can be watched; a remote git URI leaves the
/// monitor idle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Source-control backed repository.
    pub git: Option<GitRepository>,

    /// Plain directories on the local filesystem.
    pub native: Option<NativeRepository>,
}

impl RepositoryConfig {
    /// A git repository at `uri`.
    pub fn git(uri: impl Into<String>) -> Self {
        Self {
            git: Some(GitRepository { uri: uri.into() }),
            native: None,
        }
    }

    /// A native repository over the given search locations.
    pub fn native<I, S>(search_locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            git: None,
            native: Some(NativeRepository {
                search_locations: search_locations.into_iter().map(Into::into).collect(),
            }),
        }
    }
}

/// A source-control repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRepository {
    /// Repository URI, e.g. `file:///srv/config-repo` or `https://...`.
    pub uri: String,
}

/// A repository made of local search locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeRepository {
    /// Locations searched for property files, in priority order.
    #[serde(default)]
    pub search_locations: Vec<String>,
}

/// Compiled exclusion globs plus the version-control filter.
#[derive(Debug, Clone)]
pub struct ExcludePatterns {
    patterns: Vec<WildMatch>,
}

impl ExcludePatterns {
    /// Compile the given globs. `*` and `?` are the only wildcards.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| WildMatch::new(p.as_ref())).collect(),
        }
    }

    /// Check if a bare file name matches one of the globs.
    pub fn matches_name(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    /// Check if a changed file should be ignored.
    pub fn should_exclude(&self, path: &Path) -> bool {
        if is_vcs_metadata(path) {
            return true;
        }

        path.file_name()
            .is_some_and(|name| self.matches_name(&name.to_string_lossy()))
    }
}

impl From<&MonitorConfig> for ExcludePatterns {
    fn from(config: &MonitorConfig) -> Self {
        Self::new(&config.excludes)
    }
}

/// Check if any segment of `path` is a version-control metadata directory.
pub fn is_vcs_metadata(path: &Path) -> bool {
    path.components().any(|c| is_vcs_metadata_name(c.as_os_str()))
}

pub(crate) fn is_vcs_metadata_name(name: &OsStr) -> bool {
    VCS_METADATA_DIRS.iter().any(|dir| name == OsStr::new(dir))
}
