use crate::error::Result;
use crate::git::ChangeDetector;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Mock detector reporting a fixed set of changed module names
#[derive(Debug, Clone, Default)]
pub struct StaticChanges {
    changed: BTreeSet<String>,
}

impl StaticChanges {
    /// A clean tree: nothing changed
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `name` as changed whenever it is among the queried dirs
    pub fn with_changed(mut self, name: impl Into<String>) -> Self {
        self.changed.insert(name.into());
        self
    }
}

impl ChangeDetector for StaticChanges {
    fn changed_modules(&self, dirs: &[PathBuf]) -> Result<BTreeSet<String>> {
        Ok(dirs
            .iter()
            .filter_map(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| self.changed.contains(name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_changes_filters_to_queried_dirs() {
        let detector = StaticChanges::new().with_changed("foo").with_changed("baz");
        let dirs = vec![PathBuf::from("/repo/foo"), PathBuf::from("/repo/bar")];

        let changed = detector.changed_modules(&dirs).unwrap();
        assert_eq!(changed.len(), 1);
        assert!(changed.contains("foo"));
    }

    #[test]
    fn test_static_changes_default_is_clean() {
        let detector = StaticChanges::default();
        assert!(detector
            .changed_modules(&[PathBuf::from("/repo/foo")])
            .unwrap()
            .is_empty());
    }
}
