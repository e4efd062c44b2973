use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{BundleVersion, Revisioned, initial_ts};

/// A named, versioned dependency bundle.
///
/// `versions` is only populated by queries and is never written to disk.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Bundle {
    #[serde(default = "initial_ts")]
    pub ts: u64,
    pub name: String,
    /// Tag name to version. A tag points at exactly one version.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(skip)]
    pub versions: Vec<BundleVersion>,
}

impl Bundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            ts: initial_ts(),
            name: name.into(),
            tags: BTreeMap::new(),
            versions: Vec::new(),
        }
    }

    /// The version a tag points at, if any.
    pub fn tagged_version(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }

    /// First query candidate, the one commands act on.
    pub fn preferred_version(&self) -> Option<&BundleVersion> {
        self.versions.first()
    }
}

impl Revisioned for Bundle {
    fn ts(&self) -> u64 {
        self.ts
    }

    fn set_ts(&mut self, ts: u64) {
        self.ts = ts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_missing_ts_defaults_to_one() {
        let bundle: Bundle = serde_json::from_str(r#"{"name":"dummy"}"#).unwrap();
        assert_eq!(bundle.ts, 1);
        assert!(bundle.tags.is_empty());
        assert!(bundle.versions.is_empty());
    }

    #[test]
    fn test_bundle_versions_are_not_serialized() {
        let mut bundle = Bundle::new("dummy");
        bundle.versions.push(BundleVersion::new("1.0.0"));
        bundle.tags.insert("latest".into(), "1.0.0".into());

        let json: serde_json::Value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ts": 1, "name": "dummy", "tags": {"latest": "1.0.0"}})
        );
    }

    #[test]
    fn test_tagged_version() {
        let mut bundle = Bundle::new("dummy");
        bundle.tags.insert("latest".into(), "2.0.0".into());
        bundle.tags.insert("beta".into(), "3.0.0-rc.1".into());

        assert_eq!(bundle.tagged_version("latest"), Some("2.0.0"));
        assert_eq!(bundle.tagged_version("next"), None);
        assert_eq!(bundle.tagged_version("beta"), Some("3.0.0-rc.1"));
    }
}
