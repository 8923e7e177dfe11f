//! Logical service identifiers derived from property file names.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stem that addresses every service.
const SHARED_STEM: &str = "application";

/// The target of a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceId {
    /// Every service (`*` on the wire).
    All,

    /// The service with this name.
    Specific(String),
}

impl ServiceId {
    /// Wire form of [`ServiceId::All`].
    pub const WILDCARD: &'static str = "*";

    /// Derive the service a changed property file belongs to.
    ///
    /// The file name's stem decides: `application.yml` is shared by every
    /// service, `foo.properties` belongs to `foo`. Both `/` and `\` separate
    /// directories. Returns `None` when there is no stem, e.g. for `.yml`.
    pub fn from_path(path: &str) -> Option<Self> {
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let stem = match file_name.rfind('.') {
            Some(dot) => &file_name[..dot],
            None => file_name,
        };

        match stem {
            "" => None,
            SHARED_STEM => Some(Self::All),
            stem => Some(Self::Specific(stem.to_string())),
        }
    }

    /// The wire form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => Self::WILDCARD,
            Self::Specific(name) => name,
        }
    }

    /// Check if a service called `name` should act on this id.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Specific(service) => service == name,
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        if value == Self::WILDCARD {
            Self::All
        } else {
            Self::Specific(value.to_string())
        }
    }
}

impl Serialize for ServiceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ServiceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from(value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_path() {
        assert_eq!(ServiceId::from_path("application.yml"), Some(ServiceId::All));
        assert_eq!(
            ServiceId::from_path("/foo/bar.properties"),
            Some(ServiceId::Specific("bar".to_string()))
        );
        assert_eq!(
            ServiceId::from_path("C:\\repo\\orders.yml"),
            Some(ServiceId::Specific("orders".to_string()))
        );
        assert_eq!(
            ServiceId::from_path("/repo/Makefile"),
            Some(ServiceId::Specific("Makefile".to_string()))
        );
        assert_eq!(
            ServiceId::from_path("/repo/app.dev.yml"),
            Some(ServiceId::Specific("app.dev".to_string()))
        );
        assert_eq!(ServiceId::from_path("/repo/.yml"), None);
        assert_eq!(ServiceId::from_path(""), None);
    }

    #[test]
    fn test_shared_stem_is_case_sensitive() {
        assert_eq!(
            ServiceId::from_path("Application.yml"),
            Some(ServiceId::Specific("Application".to_string()))
        );
    }

    #[test]
    fn test_matches() {
        assert!(ServiceId::All.matches("orders"));
        assert!(ServiceId::from("orders").matches("orders"));
        assert!(!ServiceId::from("orders").matches("billing"));
    }

    #[test]
    fn test_wire_form() {
        let ids = vec![ServiceId::Specific("bar".to_string()), ServiceId::All];
        let json = serde_json::to_string(&ids).unwrap();

        assert_eq!(json, r#"["bar","*"]"#);
        assert_eq!(serde_json::from_str::<Vec<ServiceId>>(&json).unwrap(), ids);
    }
}
