use serde::{Deserialize, Serialize};
use std::fmt;

/// Name and version of a module, as declared in its metadata file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameVersion {
    pub name: String,
    pub version: String,
}

impl NameVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        NameVersion {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Index lookup key, `name-version`
    pub fn key(&self) -> String {
        key(&self.name, &self.version)
    }
}

impl fmt::Display for NameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// A module version tracked in an index, with the hash of its archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: String,
    pub version: String,
    pub sha256sum: String,
}

impl ModuleRecord {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        sha256sum: impl Into<String>,
    ) -> Self {
        ModuleRecord {
            name: name.into(),
            version: version.into(),
            sha256sum: sha256sum.into(),
        }
    }

    /// Build a record from a declared module and its archive digest
    pub fn from_declared(id: NameVersion, sha256sum: impl Into<String>) -> Self {
        ModuleRecord {
            name: id.name,
            version: id.version,
            sha256sum: sha256sum.into(),
        }
    }

    pub fn key(&self) -> String {
        key(&self.name, &self.version)
    }
}

impl fmt::Display for ModuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

fn key(name: &str, version: &str) -> String {
    format!("{}-{}", name, version)
}
