use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::commands::accepts::{AcceptsSource, ProviderRegistry, resolve_accepts};
use crate::commands::spec::{CommandSpec, DataSpec, OptionSpec, SpecFile};
use crate::commands::tree::is_spec_file;
use crate::config_file::ConfigError;

/// Spec artifacts in `dir`, sorted by name
///
/// # Errors
///
/// Returns `ConfigError::DirectoryNotFound` if `dir` is not a readable directory.
pub async fn spec_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|_| ConfigError::DirectoryNotFound(dir.to_path_buf()))?;
    let mut files = Vec::new();
    while let Ok(Some(entry)) = read_dir.next_entry().await {
        if !is_spec_file(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let path = entry.path();
        if tokio::fs::metadata(&path).await.is_ok_and(|meta| meta.is_file()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn parse_spec(path: &Path, contents: &str) -> Result<SpecFile, ConfigError> {
    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(contents).map_err(|e| ConfigError::SpecJson {
            source: e,
            path: path.to_path_buf(),
        })
    } else {
        serde_yaml::from_str(contents).map_err(|e| ConfigError::SpecYaml {
            source: e,
            path: path.to_path_buf(),
        })
    }
}

async fn resolve_option(
    name: &str,
    option: OptionSpec<AcceptsSource>,
    path: &Path,
    providers: &ProviderRegistry,
) -> Result<OptionSpec, ConfigError> {
    let accepts = match option.accepts {
        Some(source) => Some(resolve_accepts(source, name, path, providers).await?),
        None => None,
    };
    Ok(OptionSpec {
        description: option.description,
        shorthand: option.shorthand,
        cascades: option.cascades,
        required: option.required,
        value_type: option.value_type,
        accepts,
    })
}

async fn resolve_data(
    data: DataSpec<AcceptsSource>,
    path: &Path,
    providers: &ProviderRegistry,
) -> Result<DataSpec, ConfigError> {
    let accepts = match data.accepts {
        Some(source) => Some(resolve_accepts(source, "data", path, providers).await?),
        None => None,
    };
    Ok(DataSpec {
        description: data.description,
        required: data.required,
        value_type: data.value_type,
        accepts,
        ignore_flags_and_options: data.ignore_flags_and_options,
    })
}

/// Load the one spec artifact in `dir` and resolve its dynamic accepts lists.
///
/// Accepts sources are resolved one after another, in name order, data last.
///
/// # Errors
///
/// Returns `ConfigError::DirectoryNotFound` if the directory is missing,
/// `ConfigError::SpecCount` unless there is exactly one spec artifact,
/// `ConfigError::SpecRead`/`SpecYaml`/`SpecJson` if it cannot be read or parsed,
/// and any error from resolving accepts.
pub async fn load_spec(dir: &Path, providers: &ProviderRegistry) -> Result<CommandSpec, ConfigError> {
    let mut files = spec_files(dir).await?;
    if files.len() != 1 {
        return Err(ConfigError::SpecCount {
            dir: dir.to_path_buf(),
            found: files.len(),
        });
    }
    let path = files.remove(0);
    debug!("Loading spec file {}", path.display());
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ConfigError::SpecRead {
            source: e,
            path: path.clone(),
        })?;
    let file = parse_spec(&path, &contents)?;

    let mut options = BTreeMap::new();
    for (name, option) in file.options {
        let resolved = resolve_option(&name, option, &path, providers).await?;
        options.insert(name, resolved);
    }
    let data = match file.data {
        Some(data) => Some(resolve_data(data, &path, providers).await?),
        None => None,
    };

    Ok(CommandSpec {
        description: file.description,
        execute_on_cascade: file.execute_on_cascade,
        accepts_pass_through_args: file.accepts_pass_through_args,
        flags: file.flags,
        options,
        data,
    })
}
