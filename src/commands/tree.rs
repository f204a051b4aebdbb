use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::trace;
use parking_lot::Mutex;

use crate::commands::accepts::ProviderRegistry;
use crate::commands::spec::CommandSpec;

/// Characters that never appear in a command segment; stripping them keeps tokens like
/// `.` and `..` from walking out of the command tree.
const PATH_HAZARDS: &[char] = &['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>', '.'];

const SPEC_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Strip path-hazard characters from a candidate command segment
#[must_use]
pub fn sanitize_segment(segment: &str) -> String {
    segment.chars().filter(|c| !PATH_HAZARDS.contains(c)).collect()
}

/// Whether a file name follows the spec artifact pattern (`spec.yaml`, `list.spec.json`, ...)
#[must_use]
pub fn is_spec_file(file_name: &str) -> bool {
    let Some((stem, extension)) = file_name.rsplit_once('.') else {
        return false;
    };
    SPEC_EXTENSIONS.contains(&extension) && (stem == "spec" || stem.ends_with(".spec"))
}

fn dir_name(dir: &Path) -> Option<String> {
    match dir.file_name() {
        Some(name) => Some(name.to_string_lossy().into_owned()),
        None => dir
            .canonicalize()
            .ok()?
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
    }
}

fn sorted_entries(dir: &Path) -> Vec<std::fs::DirEntry> {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut entries: Vec<_> = read_dir.filter_map(Result::ok).collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);
    entries
}

/// Files in `dir` that could serve as its handler: named after the directory
/// (any extension) and not a spec artifact.
#[must_use]
pub fn handler_artifacts(dir: &Path) -> Vec<PathBuf> {
    let Some(name) = dir_name(dir) else {
        return Vec::new();
    };
    sorted_entries(dir)
        .into_iter()
        .filter(|entry| entry.path().is_file())
        .filter(|entry| {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            !is_spec_file(&file_name) && file_name.split('.').next() == Some(name.as_str())
        })
        .map(|entry| entry.path())
        .collect()
}

/// The single handler artifact of `dir`, if there is exactly one
#[must_use]
pub fn handler_artifact(dir: &Path) -> Option<PathBuf> {
    let mut artifacts = handler_artifacts(dir);
    if artifacts.len() == 1 {
        artifacts.pop()
    } else {
        None
    }
}

/// Outcome of trying to extend a command path by one token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub is_command: bool,
    pub new_prefix: PathBuf,
}

/// A program's command hierarchy, rooted at a directory.
///
/// Loaded specs are cached per directory, so providers and `accepts` commands
/// run once per level. Clones share the cache.
#[derive(Debug, Clone)]
pub struct CommandTree {
    root: PathBuf,
    providers: ProviderRegistry,
    specs: Arc<Mutex<HashMap<PathBuf, CommandSpec>>>,
}

impl CommandTree {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CommandTree {
            root: root.into(),
            providers: ProviderRegistry::new(),
            specs: Arc::default(),
        }
    }

    /// Forget every loaded spec; the next load reads the files again
    pub fn clear_cache(&self) {
        self.specs.lock().clear();
    }

    pub(crate) fn cached_spec(&self, dir: &Path) -> Option<CommandSpec> {
        self.specs.lock().get(dir).cloned()
    }

    pub(crate) fn cache_spec(&self, dir: PathBuf, spec: CommandSpec) {
        self.specs.lock().insert(dir, spec);
    }

    /// Providers used to resolve `accepts: { provider: ... }` while loading specs
    #[must_use]
    pub fn with_providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Directory for a space-separated command path; the empty path is the root
    #[must_use]
    pub fn dir_for(&self, command: &str) -> PathBuf {
        command
            .split_whitespace()
            .fold(self.root.clone(), |dir, piece| dir.join(piece))
    }

    /// Whether `segment` names a command directly under `prefix`.
    ///
    /// Never fails: anything unreadable or ambiguous is simply not a command.
    #[must_use]
    pub fn resolve(&self, prefix: &Path, segment: &str) -> Resolution {
        let sanitized = sanitize_segment(segment);
        let candidate = prefix.join(segment);
        let is_command = !sanitized.is_empty()
            && sanitized == segment
            && handler_artifact(&candidate).is_some();
        trace!("Segment `{segment}` under {}: command={is_command}", prefix.display());
        Resolution {
            is_command,
            new_prefix: if is_command {
                candidate
            } else {
                prefix.to_path_buf()
            },
        }
    }

    /// Names of the commands directly below `command`
    #[must_use]
    pub fn subcommands(&self, command: &str) -> Vec<String> {
        let dir = self.dir_for(command);
        sorted_entries(&dir)
            .into_iter()
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| self.resolve(&dir, name).is_command)
            .collect()
    }

    /// Every reachable command path below the root, depth first
    #[must_use]
    pub fn all_commands(&self) -> Vec<String> {
        let mut commands = Vec::new();
        self.collect_commands("", &mut commands);
        commands
    }

    fn collect_commands(&self, command: &str, commands: &mut Vec<String>) {
        for name in self.subcommands(command) {
            let child = if command.is_empty() {
                name
            } else {
                format!("{command} {name}")
            };
            commands.push(child.clone());
            self.collect_commands(&child, commands);
        }
    }
}
