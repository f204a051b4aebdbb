//! Accepted-value lists that may be computed when a spec is loaded

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config_file::ConfigError;
use crate::error::BoxError;

/// Where a spec's `accepts` list comes from
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AcceptsSource {
    /// An inline list of scalars
    Values(Vec<Value>),
    /// A provider registered by the embedding application
    Provider { provider: String },
    /// A shell command whose stdout is a JSON array
    Command { command: String },
}

type SyncFn = dyn Fn() -> Result<Value, BoxError> + Send + Sync;
type AsyncFn = dyn Fn() -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync;

/// A programmatic source of accepted values
#[derive(Clone)]
pub enum AcceptsProvider {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

impl AcceptsProvider {
    async fn resolve(&self) -> Result<Value, BoxError> {
        match self {
            AcceptsProvider::Sync(f) => f(),
            AcceptsProvider::Async(f) => f().await,
        }
    }
}

impl std::fmt::Debug for AcceptsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcceptsProvider::Sync(_) => f.write_str("AcceptsProvider::Sync"),
            AcceptsProvider::Async(_) => f.write_str("AcceptsProvider::Async"),
        }
    }
}

/// Named accepts providers, referenced from spec files as `accepts: { provider: <name> }`
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, AcceptsProvider>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_sync<F>(&mut self, name: impl Into<String>, provider: F) -> &mut Self
    where
        F: Fn() -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.providers
            .insert(name.into(), AcceptsProvider::Sync(Arc::new(provider)));
        self
    }

    pub fn register_async<F>(&mut self, name: impl Into<String>, provider: F) -> &mut Self
    where
        F: Fn() -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync + 'static,
    {
        self.providers
            .insert(name.into(), AcceptsProvider::Async(Arc::new(provider)));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AcceptsProvider> {
        self.providers.get(name)
    }
}

async fn run_command(command: &str, cwd: &Path) -> Result<Value, BoxError> {
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .output()
        .await?;
    if !output.status.success() {
        return Err(format!(
            "`{command}` exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )
        .into());
    }
    Ok(serde_json::from_slice(&output.stdout)?)
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Materialize an accepts source into the list of values a token is compared against.
///
/// Every variant goes through the same awaitable step, so callers never care
/// whether the list was inline, computed synchronously, or fetched.
///
/// # Errors
///
/// Returns `ConfigError::UnknownProvider` for an unregistered provider name,
/// `ConfigError::Provider` if the provider or command fails, and
/// `ConfigError::AcceptsNotList` if the result is not an array of scalars.
pub async fn resolve_accepts(
    source: AcceptsSource,
    name: &str,
    spec_path: &Path,
    providers: &ProviderRegistry,
) -> Result<Vec<String>, ConfigError> {
    let provider_error = |source: BoxError| ConfigError::Provider {
        path: spec_path.to_path_buf(),
        name: name.to_string(),
        source,
    };
    let resolved = match source {
        AcceptsSource::Values(values) => Value::Array(values),
        AcceptsSource::Provider { provider } => {
            debug!("Resolving accepts for `{name}` from provider `{provider}`");
            let Some(registered) = providers.get(&provider) else {
                return Err(ConfigError::UnknownProvider {
                    path: spec_path.to_path_buf(),
                    name: name.to_string(),
                    provider,
                });
            };
            registered.resolve().await.map_err(provider_error)?
        }
        AcceptsSource::Command { command } => {
            debug!("Resolving accepts for `{name}` from command `{command}`");
            let cwd = spec_path.parent().unwrap_or(Path::new("."));
            run_command(&command, cwd).await.map_err(provider_error)?
        }
    };

    let not_list = || ConfigError::AcceptsNotList {
        path: spec_path.to_path_buf(),
        name: name.to_string(),
    };
    let Value::Array(values) = resolved else {
        return Err(not_list());
    };
    values
        .into_iter()
        .map(|value| scalar_to_string(value).ok_or_else(not_list))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;

    fn path() -> &'static Path {
        Path::new("/tree/spec.yaml")
    }

    #[tokio::test]
    async fn test_inline_values_are_stringified() {
        let source = AcceptsSource::Values(vec![json!("small"), json!(12), json!(true)]);
        let values = resolve_accepts(source, "size", path(), &ProviderRegistry::new())
            .await
            .unwrap();
        assert_eq!(values, vec!["small", "12", "true"]);
    }

    #[tokio::test]
    async fn test_sync_and_async_providers() {
        let mut providers = ProviderRegistry::new();
        providers
            .register_sync("sizes", || Ok(json!(["small", "large"])))
            .register_async("crusts", || async { Ok::<_, BoxError>(json!(["thin", "deep"])) }.boxed());

        let sizes = resolve_accepts(
            AcceptsSource::Provider {
                provider: "sizes".to_string(),
            },
            "size",
            path(),
            &providers,
        )
        .await
        .unwrap();
        assert_eq!(sizes, vec!["small", "large"]);

        let crusts = resolve_accepts(
            AcceptsSource::Provider {
                provider: "crusts".to_string(),
            },
            "crust",
            path(),
            &providers,
        )
        .await
        .unwrap();
        assert_eq!(crusts, vec!["thin", "deep"]);
    }

    #[tokio::test]
    async fn test_provider_must_return_array() {
        let mut providers = ProviderRegistry::new();
        providers.register_sync("broken", || Ok(json!({"not": "a list"})));
        let result = resolve_accepts(
            AcceptsSource::Provider {
                provider: "broken".to_string(),
            },
            "size",
            path(),
            &providers,
        )
        .await;
        match result {
            Err(ConfigError::AcceptsNotList { name, .. }) => assert_eq!(name, "size"),
            other => panic!("Expected AcceptsNotList, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let result = resolve_accepts(
            AcceptsSource::Provider {
                provider: "missing".to_string(),
            },
            "size",
            path(),
            &ProviderRegistry::new(),
        )
        .await;
        assert!(matches!(result, Err(ConfigError::UnknownProvider { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_source() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("spec.yaml");
        let values = resolve_accepts(
            AcceptsSource::Command {
                command: r#"echo '["pepperoni", "olives"]'"#.to_string(),
            },
            "topping",
            &spec_path,
            &ProviderRegistry::new(),
        )
        .await
        .unwrap();
        assert_eq!(values, vec!["pepperoni", "olives"]);
    }
}
