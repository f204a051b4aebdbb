//! Handler invocation for a classified command
//!
//! Every level on the path from the root to the classified command may run a
//! handler: ancestors only when their own spec sets `executeOnCascade`, the
//! command itself always. Handlers run in order, root first, and the first
//! non-zero exit code stops the chain.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::{debug, error, info};

use crate::args::input::InputObject;
use crate::commands::inherit::Level;
use crate::commands::spec::{HELP_FLAG, VERSION_FLAG};
use crate::commands::tree::handler_artifact;
use crate::config_file::ConfigError;
use crate::context::Context;
use crate::error::{BoxError, RouterError};
use crate::help;
use crate::report;

/// Exit code meaning "the error was already printed, do not print it again"
pub const ALREADY_REPORTED: i32 = 255;

/// Environment variable carrying the JSON-encoded input to spawned handlers
pub const INPUT_ENV: &str = "TREEARGS_INPUT";

type HandlerFn = dyn Fn(InputObject) -> BoxFuture<'static, Result<i32, BoxError>> + Send + Sync;

/// In-process handlers keyed by command path (`""` is the root)
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<HandlerFn>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, command: &str, handler: F) -> &mut Self
    where
        F: Fn(InputObject) -> BoxFuture<'static, Result<i32, BoxError>> + Send + Sync + 'static,
    {
        let command = command.split_whitespace().collect::<Vec<_>>().join(" ");
        self.handlers.insert(command, Arc::new(handler));
        self
    }

    fn get(&self, command: &str) -> Option<&Arc<HandlerFn>> {
        self.handlers.get(command)
    }
}

/// How a dispatch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `--help` was given; the rendered help screen
    Help(String),
    /// `--version` was given; the rendered version line
    Version(String),
    /// Handlers ran; the exit code of the last one
    Completed(i32),
}

async fn run_artifact(artifact: &Path, dir: &Path, input: &InputObject) -> Result<i32, RouterError> {
    let payload = serde_json::to_string(input).map_err(|e| RouterError::Handler {
        command: input.command.clone(),
        source: Box::new(e),
    })?;
    info!("Running handler {}", artifact.display());
    let status = tokio::process::Command::new(artifact)
        .args(input.pass_through_args.iter().flatten())
        .env(INPUT_ENV, payload)
        .current_dir(dir)
        .status()
        .await
        .map_err(|source| RouterError::Spawn {
            path: artifact.to_path_buf(),
            source,
        })?;
    Ok(status.code().unwrap_or(1))
}

async fn run_level(
    level: &Level,
    input: &InputObject,
    handlers: &HandlerRegistry,
) -> Result<i32, RouterError> {
    if let Some(handler) = handlers.get(&level.command) {
        debug!("Running in-process handler for `{}`", level.command);
        return handler(input.clone())
            .await
            .map_err(|source| RouterError::Handler {
                command: level.command.clone(),
                source,
            });
    }
    let Some(artifact) = handler_artifact(&level.dir) else {
        return Err(ConfigError::HandlerNotFound {
            command: level.command.clone(),
            dir: level.dir.clone(),
        }
        .into());
    };
    run_artifact(&artifact, &level.dir, input).await
}

/// Classify, validate and run the handler chain for the context's arguments.
///
/// # Errors
///
/// Returns the first classification, validation, configuration or handler error.
pub async fn dispatch(
    context: &mut Context,
    handlers: &HandlerRegistry,
) -> Result<Outcome, RouterError> {
    let organized = context.organized_arguments(false).await?.clone();
    if organized.has_flag(HELP_FLAG) {
        let merged = context.merged_spec(false).await?;
        let subcommands = help::subcommands(context.tree(), &organized.command).await?;
        return Ok(Outcome::Help(help::render(
            context.config(),
            &merged,
            &subcommands,
        )));
    }
    if organized.has_flag(VERSION_FLAG) {
        return Ok(Outcome::Version(help::render_version(context.config())));
    }

    let input = context.input(false).await?;
    let levels = context.tree().lineage(&organized.command).await?;
    let last = levels.len().saturating_sub(1);
    for (i, level) in levels.iter().enumerate() {
        if i != last && !level.spec.execute_on_cascade {
            continue;
        }
        let code = run_level(level, &input, handlers).await?;
        if code != 0 {
            debug!("Handler for `{}` exited with {code}", level.command);
            return Ok(Outcome::Completed(code));
        }
    }
    Ok(Outcome::Completed(0))
}

/// Dispatch and turn the outcome into a process exit code, printing help,
/// version or the error report along the way.
pub async fn run(context: &mut Context, handlers: &HandlerRegistry) -> i32 {
    match dispatch(context, handlers).await {
        Ok(Outcome::Help(text) | Outcome::Version(text)) => {
            print!("{text}");
            0
        }
        Ok(Outcome::Completed(code)) => code,
        Err(err) => {
            error!("{err}");
            report::print_error(&err);
            1
        }
    }
}
