//! Configuration file handling for treeargs
//!
//! Two kinds of on-disk configuration live here: the router's own config file
//! (`.treeargs.yaml` and friends), and the error family raised when a command
//! tree's specification artifacts are missing or malformed.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors caused by a broken CLI definition rather than by user input
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No config file found in current directory or its parents: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON config file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Command directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("There should be exactly one spec file in {dir}, found {found}")]
    SpecCount { dir: PathBuf, found: usize },
    #[error("Unable to read spec file {path}: {source}")]
    SpecRead {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("Unable to parse YAML spec file {path}: {source}")]
    SpecYaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON spec file {path}: {source}")]
    SpecJson {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("accepts for `{name}` in {path} must resolve to an array of scalar values")]
    AcceptsNotList { path: PathBuf, name: String },
    #[error("Unknown accepts provider `{provider}` referenced by `{name}` in {path}")]
    UnknownProvider {
        path: PathBuf,
        name: String,
        provider: String,
    },
    #[error("accepts provider for `{name}` in {path} failed: {source}")]
    Provider {
        path: PathBuf,
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Unrecognized type `{value}` declared for `{name}`, expected `integer` or `float`")]
    UnknownType { name: String, value: String },
    #[error("Expected exactly one handler for command `{command}` in {dir}")]
    HandlerNotFound { command: String, dir: PathBuf },
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

fn default_root() -> PathBuf {
    PathBuf::from("commands")
}

fn default_suggestion_threshold() -> f64 {
    0.4
}

/// Router settings supplied by the embedding application or a config file
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RouterConfig {
    /// Program name shown on help and version screens
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Command root; relative paths are resolved against the config file's directory
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Best fuzzy score (0.0 is an exact match) a "did you mean" suggestion must beat
    #[serde(default = "default_suggestion_threshold")]
    pub suggestion_threshold: f64,
    /// Forward the built-in `help`/`version` flags to handlers
    #[serde(default)]
    pub forward_builtin_flags: bool,
    #[serde(default)]
    pub verbose: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            name: String::new(),
            version: None,
            root: default_root(),
            suggestion_threshold: default_suggestion_threshold(),
            forward_builtin_flags: false,
            verbose: false,
        }
    }
}

impl RouterConfig {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RouterConfig {
            root: root.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_suggestion_threshold(mut self, threshold: f64) -> Self {
        self.suggestion_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_forward_builtin_flags(mut self, forward: bool) -> Self {
        self.forward_builtin_flags = forward;
        self
    }

    /// Loads and parses a configuration file, anchoring a relative `root` at the file's directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file cannot be read, or
    /// `ConfigError::Yaml`/`ConfigError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<RouterConfig, ConfigError> {
        let contents = std::fs::read_to_string(file)
            .map_err(|_| ConfigError::ConfigNotFound(file.to_path_buf()))?;
        let mut config: RouterConfig = if file.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
                source: e,
                path: file.to_path_buf(),
            })?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })?
        };
        if config.root.is_relative()
            && let Some(parent) = file.parent()
        {
            config.root = parent.join(&config.root);
        }
        Ok(config)
    }

    /// Searches for a configuration file in the current directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownWorkingDirectory` if the cwd cannot be determined,
    /// or `ConfigError::ConfigNotFound` if no config file is found.
    pub fn find_config() -> Result<PathBuf, ConfigError> {
        let cwd = std::env::current_dir()
            .map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))?;
        find_config_from(&cwd)
    }
}

/// List of supported configuration file names
const FILENAMES: [&str; 3] = [".treeargs.json", ".treeargs.yaml", ".treeargs.yml"];

fn find_config_from(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut path = start.to_path_buf();
    debug!("Searching for config file in {}", start.display());
    loop {
        for file in &FILENAMES {
            let config_path = path.join(file);
            if config_path.exists() {
                info!("Found config file: {}", config_path.display());
                return Ok(config_path);
            }
        }
        if !path.pop() {
            return Err(ConfigError::ConfigNotFound(start.to_path_buf()));
        }
    }
}
