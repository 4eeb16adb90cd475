//! Index document model shared by the development and release channels

use crate::domain::module::ModuleRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which index a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexChannel {
    /// Every module version, including `-dev` pre-releases
    Development,
    /// Only versions without a pre-release qualifier
    Release,
}

impl fmt::Display for IndexChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexChannel::Development => write!(f, "development"),
            IndexChannel::Release => write!(f, "release"),
        }
    }
}

/// Everything needed to read or synthesize one channel's index file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    pub channel: IndexChannel,
    pub path: PathBuf,
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexMetadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexSpec {
    #[serde(default)]
    pub modules: Vec<ModuleRecord>,
}

/// The persisted index: a schema header plus an ordered list of records
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: IndexMetadata,
    #[serde(default)]
    pub spec: IndexSpec,
}

impl IndexDocument {
    /// Create a document for a channel holding exactly `modules`
    pub fn fresh(target: &IndexTarget, modules: Vec<ModuleRecord>) -> Self {
        IndexDocument {
            api_version: target.api_version.clone(),
            kind: target.kind.clone(),
            metadata: IndexMetadata {
                name: target.name.clone(),
            },
            spec: IndexSpec { modules },
        }
    }

    /// A document missing any header field or holding no modules counts as
    /// "no index yet"
    pub fn is_empty(&self) -> bool {
        self.api_version.is_empty()
            || self.kind.is_empty()
            || self.metadata.name.is_empty()
            || self.spec.modules.is_empty()
    }

    pub fn modules(&self) -> &[ModuleRecord] {
        &self.spec.modules
    }
}
