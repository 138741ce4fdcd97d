//! Schema dialect versions and their `$schema` locators.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// The schema drafts the engine can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    /// JSON Schema draft 3.
    DraftV3,
    /// JSON Schema draft 4.
    DraftV4,
}

impl SchemaVersion {
    /// Every known version.
    pub const ALL: [SchemaVersion; 2] = [SchemaVersion::DraftV3, SchemaVersion::DraftV4];

    /// The `$schema` value identifying this version.
    pub fn locator(self) -> &'static str {
        match self {
            SchemaVersion::DraftV3 => "http://json-schema.org/draft-03/schema#",
            SchemaVersion::DraftV4 => "http://json-schema.org/draft-04/schema#",
        }
    }

    /// Looks up the version whose locator is exactly `locator`.
    pub fn from_locator(locator: &str) -> Option<Self> {
        static LOCATORS: OnceLock<HashMap<&'static str, SchemaVersion>> = OnceLock::new();
        LOCATORS
            .get_or_init(|| Self::ALL.iter().map(|v| (v.locator(), *v)).collect())
            .get(locator)
            .copied()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::DraftV3 => write!(f, "draft-03"),
            SchemaVersion::DraftV4 => write!(f, "draft-04"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_round_trip() {
        for version in SchemaVersion::ALL {
            assert_eq!(SchemaVersion::from_locator(version.locator()), Some(version));
        }
    }

    #[test]
    fn test_unknown_locators() {
        assert_eq!(SchemaVersion::from_locator("http://json-schema.org/draft-04/schema"), None);
        assert_eq!(SchemaVersion::from_locator(""), None);
    }
}
