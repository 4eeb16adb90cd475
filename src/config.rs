use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{IndexChannel, IndexTarget};
use crate::error::{ModuleBuilderError, Result};

/// Name of the configuration file searched in the working directory.
pub const CONFIG_FILE_NAME: &str = "modulebuilder.toml";

/// Represents the complete configuration for module-builder.
///
/// Contains the archive output location, the per-module metadata file name,
/// index channel settings and the git invocation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub git: GitConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("_artifacts")
}

fn default_metadata_file() -> String {
    "metadata.yaml".to_string()
}

fn default_dev_file() -> PathBuf {
    PathBuf::from("index-dev.yaml")
}

fn default_release_file() -> PathBuf {
    PathBuf::from("index.yaml")
}

fn default_api_version() -> String {
    "kaas.mirantis.com/v1alpha1".to_string()
}

fn default_kind() -> String {
    "HostOSConfigurationModules".to_string()
}

fn default_dev_name() -> String {
    "host-os-modules-dev".to_string()
}

fn default_release_name() -> String {
    "host-os-modules".to_string()
}

fn default_git_program() -> String {
    "git".to_string()
}

/// Index file locations and the schema header written into fresh documents.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexConfig {
    #[serde(default = "default_dev_file")]
    pub dev_file: PathBuf,

    #[serde(default = "default_release_file")]
    pub release_file: PathBuf,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default = "default_dev_name")]
    pub dev_name: String,

    #[serde(default = "default_release_name")]
    pub release_name: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            dev_file: default_dev_file(),
            release_file: default_release_file(),
            api_version: default_api_version(),
            kind: default_kind(),
            dev_name: default_dev_name(),
            release_name: default_release_name(),
        }
    }
}

impl IndexConfig {
    /// Resolve the index file and header for one channel.
    ///
    /// Relative file names are resolved against `base`.
    pub fn target(&self, channel: IndexChannel, base: &Path) -> IndexTarget {
        let (file, name) = match channel {
            IndexChannel::Development => (&self.dev_file, &self.dev_name),
            IndexChannel::Release => (&self.release_file, &self.release_name),
        };

        IndexTarget {
            channel,
            path: base.join(file),
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            name: name.clone(),
        }
    }
}

/// How the external `git` is invoked.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    #[serde(default = "default_git_program")]
    pub program: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            program: default_git_program(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_dir: default_output_dir(),
            metadata_file: default_metadata_file(),
            index: IndexConfig::default(),
            git: GitConfig::default(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `modulebuilder.toml` in current directory
/// 3. `.modulebuilder.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let local = Path::new(".").join(CONFIG_FILE_NAME);

    let path = if let Some(path) = config_path {
        path.to_path_buf()
    } else if local.exists() {
        local
    } else if let Some(config_dir) = dirs::config_dir() {
        let user_path = config_dir.join(format!(".{}", CONFIG_FILE_NAME));
        if user_path.exists() {
            user_path
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path).map_err(|e| ModuleBuilderError::file(&path, e))?;
    toml::from_str(&config_str).map_err(|e| {
        ModuleBuilderError::config(format!("Failed to parse {}: {}", path.display(), e))
    })
}
