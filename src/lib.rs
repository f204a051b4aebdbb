//! Core implementation of the treeargs command router
//!
//! treeargs turns a directory tree into a command-line interface. Every
//! directory below the command root is a command: it holds one handler artifact
//! named after the directory and one spec artifact (`spec.yaml`, `spec.json`, ...)
//! declaring the command's flags, options and data. Raw arguments are
//! classified against the spec merged along the command's path, validated, and
//! handed to the handler chain as a single input object.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config_file::{ConfigError, RouterConfig};

pub mod args;
pub mod commands;
pub mod config_file;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod help;
pub mod logger;
pub mod report;
pub mod suggest;

/// Load the router configuration from a file, or auto-detect one.
///
/// When `config_file` is `None` and no config file exists, a default
/// configuration rooted at `./commands` is used. `root` overrides the
/// configured command root.
///
/// # Errors
///
/// Returns `ConfigError` if an explicit config file does not exist, a config
/// file cannot be parsed, contains invalid values, or the command root is not
/// a directory.
pub fn load_config(
    config_file: Option<&str>,
    root: Option<&Path>,
) -> Result<RouterConfig, ConfigError> {
    let mut config = match config_file {
        Some(file) => {
            let config_path = PathBuf::from(file);
            if !config_path.exists() {
                return Err(ConfigError::ConfigNotFound(config_path));
            }
            RouterConfig::from_file(&config_path)?
        }
        None => match RouterConfig::find_config() {
            Ok(config_path) => RouterConfig::from_file(&config_path)?,
            Err(ConfigError::ConfigNotFound(dir)) => {
                debug!("No config file above {}, using defaults", dir.display());
                RouterConfig::default()
            }
            Err(e) => return Err(e),
        },
    };
    if let Some(root) = root {
        config.root = root.to_path_buf();
    }
    if config.name.is_empty() {
        config.name = default_name(&config.root);
    }
    validate(&config)?;
    debug!(
        "Loaded config for `{}` (root: {})",
        config.name,
        config.root.display()
    );
    Ok(config)
}

/// The command root's directory name, used when no program name is configured
fn default_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn validate(config: &RouterConfig) -> Result<(), ConfigError> {
    if !config.root.is_dir() {
        return Err(ConfigError::DirectoryNotFound(config.root.clone()));
    }
    if !(0.0..=1.0).contains(&config.suggestion_threshold) {
        return Err(ConfigError::Validation(format!(
            "suggestion_threshold must be between 0 and 1, got {}",
            config.suggestion_threshold
        )));
    }
    if config.version.is_none() {
        warn!("No version configured; --version prints the program name only");
    }
    Ok(())
}
