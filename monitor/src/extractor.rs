//! Turns webhook payloads into the list of property files that changed.

use http::HeaderMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// The raw paths named by one inbound notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyPathNotification {
    paths: Vec<String>,
}

impl PropertyPathNotification {
    /// Create a notification for the given paths.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Paths in payload order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Consume the notification.
    pub fn into_paths(self) -> Vec<String> {
        self.paths
    }
}

/// Parses one provider's payload shape.
///
/// Returns `None` when the payload is not recognised, so a composite can try
/// the next extractor.
pub trait NotificationExtractor: Send + Sync {
    /// Extract changed paths from a request's headers and JSON body.
    fn extract(&self, headers: &HeaderMap, body: &Map<String, Value>)
    -> Option<PropertyPathNotification>;
}

/// Tries each extractor in order; the first match wins.
#[derive(Default)]
pub struct CompositeExtractor {
    extractors: Vec<Box<dyn NotificationExtractor>>,
}

impl CompositeExtractor {
    /// Create a composite over `extractors`. An empty list never matches.
    pub fn new(extractors: Vec<Box<dyn NotificationExtractor>>) -> Self {
        Self { extractors }
    }

    /// GitHub, GitLab and Bitbucket push hooks, then plain `path` bodies.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Box::new(GithubExtractor),
            Box::new(GitlabExtractor),
            Box::new(BitbucketExtractor),
            Box::new(PathExtractor),
        ])
    }

    /// Append an extractor.
    pub fn push(mut self, extractor: impl NotificationExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    /// Number of extractors.
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Check if the composite has no extractors.
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl NotificationExtractor for CompositeExtractor {
    fn extract(
        &self,
        headers: &HeaderMap,
        body: &Map<String, Value>,
    ) -> Option<PropertyPathNotification> {
        self.extractors
            .iter()
            .find_map(|extractor| extractor.extract(headers, body))
    }
}

/// Direct notifications: `{"path": "a.yml"}` or `{"path": ["a.yml", ...]}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathExtractor;

impl NotificationExtractor for PathExtractor {
    fn extract(
        &self,
        _headers: &HeaderMap,
        body: &Map<String, Value>,
    ) -> Option<PropertyPathNotification> {
        match body.get("path")? {
            Value::String(path) => Some(PropertyPathNotification::new([path.as_str()])),
            Value::Array(paths) => Some(PropertyPathNotification::new(
                paths.iter().filter_map(Value::as_str),
            )),
            _ => None,
        }
    }
}

/// GitHub `push` webhook.
#[derive(Debug, Clone, Copy, Default)]
pub struct GithubExtractor;

impl NotificationExtractor for GithubExtractor {
    fn extract(
        &self,
        headers: &HeaderMap,
        body: &Map<String, Value>,
    ) -> Option<PropertyPathNotification> {
        if header_value(headers, "x-github-event")? != "push" {
            return None;
        }
        debug!("Recognised GitHub push");
        paths_from_commits(body)
    }
}

/// GitLab `Push Hook` webhook.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitlabExtractor;

impl NotificationExtractor for GitlabExtractor {
    fn extract(
        &self,
        headers: &HeaderMap,
        body: &Map<String, Value>,
    ) -> Option<PropertyPathNotification> {
        if header_value(headers, "x-gitlab-event")? != "Push Hook" {
            return None;
        }
        debug!("Recognised GitLab push");
        paths_from_commits(body)
    }
}

/// Bitbucket `repo:push` webhook.
///
/// Bitbucket does not list changed files, so every service is refreshed.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitbucketExtractor;

impl NotificationExtractor for BitbucketExtractor {
    fn extract(
        &self,
        headers: &HeaderMap,
        _body: &Map<String, Value>,
    ) -> Option<PropertyPathNotification> {
        if header_value(headers, "x-event-key")? != "repo:push" {
            return None;
        }
        debug!("Recognised Bitbucket push");
        Some(PropertyPathNotification::new(["application.yml"]))
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

/// Files added, removed or modified across a push's commits.
fn paths_from_commits(body: &Map<String, Value>) -> Option<PropertyPathNotification> {
    let commits = body.get("commits")?.as_array()?;

    let paths = commits.iter().flat_map(|commit| {
        ["added", "removed", "modified"]
            .into_iter()
            .filter_map(move |field| commit.get(field)?.as_array())
            .flatten()
            .filter_map(Value::as_str)
    });

    Some(PropertyPathNotification::new(paths))
}
