use serde::{Deserialize, Serialize};

use super::{Revisioned, initial_ts};

/// A single published version of a bundle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BundleVersion {
    #[serde(default = "initial_ts")]
    pub ts: u64,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Store specific reference, e.g. the git branch or tag holding the version.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl BundleVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            ts: initial_ts(),
            version: version.into(),
            tag: None,
            git_ref: None,
            publisher: None,
        }
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }
}

impl Revisioned for BundleVersion {
    fn ts(&self) -> u64 {
        self.ts
    }

    fn set_ts(&mut self, ts: u64) {
        self.ts = ts;
    }
}
