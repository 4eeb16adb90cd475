use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for module-builder operations
#[derive(Error, Debug)]
pub enum ModuleBuilderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Git operation failed: {0}")]
    Git(String),

    #[error("I/O error on {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every failure collected while running one phase over all modules.
    #[error("{phase} failed: {}", join_errors(.errors))]
    Phase {
        phase: String,
        errors: Vec<ModuleBuilderError>,
    },
}

/// Convenience type alias for Results in module-builder
pub type Result<T> = std::result::Result<T, ModuleBuilderError>;

fn join_errors(errors: &[ModuleBuilderError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ModuleBuilderError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ModuleBuilderError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ModuleBuilderError::Version(msg.into())
    }

    /// Create a metadata error with context
    pub fn metadata(msg: impl Into<String>) -> Self {
        ModuleBuilderError::Metadata(msg.into())
    }

    /// Create an index error with context
    pub fn index(msg: impl Into<String>) -> Self {
        ModuleBuilderError::Index(msg.into())
    }

    /// Create an archive error with context
    pub fn archive(msg: impl Into<String>) -> Self {
        ModuleBuilderError::Archive(msg.into())
    }

    /// Create a git error with context
    pub fn git(msg: impl Into<String>) -> Self {
        ModuleBuilderError::Git(msg.into())
    }

    /// Attach the offending path to an I/O error
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ModuleBuilderError::File {
            path: path.into(),
            source,
        }
    }

    /// Fold the errors of one phase into a single error.
    ///
    /// Returns `None` when the phase produced no errors.
    pub fn phase(phase: impl Into<String>, errors: Vec<ModuleBuilderError>) -> Option<Self> {
        if errors.is_empty() {
            return None;
        }

        Some(ModuleBuilderError::Phase {
            phase: phase.into(),
            errors,
        })
    }

    /// True for errors raised because the run was misconfigured
    pub fn is_config(&self) -> bool {
        matches!(self, ModuleBuilderError::Config(_))
    }
}
