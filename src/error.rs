use thiserror::Error;

use crate::config_file::ConfigError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every failure a single invocation can end with
///
/// The first error raised aborts the pass; nothing is aggregated.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("`{argument}` is not a recognized flag or option for `{command}`")]
    UnrecognizedArgument { argument: String, command: String },
    #[error("No value was supplied for option `{option}`")]
    MissingOptionValue { option: String },
    #[error("`{value}` is not an accepted value for `{name}`. Accepted values: {}", join_accepts(.accepts))]
    UnrecognizedValue {
        name: String,
        value: String,
        accepts: Vec<String>,
    },
    #[error("`{value}` is not a valid {expected} for `{name}`")]
    TypeMismatch {
        name: String,
        value: String,
        expected: String,
    },
    #[error("{}", unexpected_data_message(.command, .data, .suggestion))]
    UnexpectedData {
        command: String,
        data: String,
        suggestion: Option<String>,
    },
    #[error("Option `{option}` is required")]
    MissingRequiredOption { option: String },
    #[error("Data is required for {}", display_command(.command))]
    MissingRequiredData { command: String },
    #[error("{} does not support pass-through arguments", display_command(.command))]
    PassThroughNotSupported { command: String },
    #[error("Handler for {} failed: {source}", display_command(.command))]
    Handler {
        command: String,
        #[source]
        source: BoxError,
    },
    #[error("Unable to run handler {path}: {source}")]
    Spawn {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_command(command: &str) -> String {
    if command.is_empty() {
        "this command".to_string()
    } else {
        format!("`{command}`")
    }
}

fn join_accepts(accepts: &[String]) -> String {
    accepts.join(", ")
}

fn unexpected_data_message(command: &str, data: &str, suggestion: &Option<String>) -> String {
    let mut message = format!(
        "{} does not accept data, but `{data}` was supplied",
        display_command(command)
    );
    if let Some(suggestion) = suggestion {
        message.push_str(&format!("\nDid you mean `{suggestion}`?"));
    }
    message
}

impl RouterError {
    /// Short heading used for the printed error banner
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            RouterError::Configuration(_) => "Configuration error",
            RouterError::UnrecognizedArgument { .. } => "Unrecognized argument",
            RouterError::MissingOptionValue { .. } => "Missing option value",
            RouterError::UnrecognizedValue { .. } => "Unrecognized value",
            RouterError::TypeMismatch { .. } => "Type mismatch",
            RouterError::UnexpectedData { .. } => "Unexpected data",
            RouterError::MissingRequiredOption { .. } => "Missing required option",
            RouterError::MissingRequiredData { .. } => "Missing required data",
            RouterError::PassThroughNotSupported { .. } => "Pass-through arguments not supported",
            RouterError::Handler { .. } | RouterError::Spawn { .. } => "Handler error",
        }
    }
}
