use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::commands::loader::load_spec;
use crate::commands::spec::{CommandSpec, FlagSpec, MergedSpec, OptionSpec};
use crate::commands::tree::CommandTree;
use crate::config_file::ConfigError;

/// One step of the walk from the root to a command
#[derive(Debug, Clone)]
pub struct Level {
    /// Space-joined command path of this level, empty for the root
    pub command: String,
    pub dir: PathBuf,
    pub spec: CommandSpec,
}

/// Declarations that may flow from an ancestor down to every descendant
pub trait Cascading: Clone {
    fn cascades(&self) -> bool;
}

impl Cascading for FlagSpec {
    fn cascades(&self) -> bool {
        self.cascades
    }
}

impl Cascading for OptionSpec {
    fn cascades(&self) -> bool {
        self.cascades
    }
}

/// Copy the declarations visible from a descendant: all of them at the leaf,
/// only cascading ones from ancestors. Deeper levels win on name clashes.
fn inherit_entries<T: Cascading>(
    merged: &mut BTreeMap<String, T>,
    level: &BTreeMap<String, T>,
    is_leaf: bool,
) {
    for (name, entry) in level {
        if is_leaf || entry.cascades() {
            merged.insert(name.clone(), entry.clone());
        }
    }
}

impl MergedSpec {
    /// Fold one level of the lineage into the merge.
    pub fn inherit(&mut self, level: &CommandSpec, is_leaf: bool) {
        inherit_entries(&mut self.flags, &level.flags, is_leaf);
        inherit_entries(&mut self.options, &level.options, is_leaf);
        if is_leaf {
            self.description.clone_from(&level.description);
            self.data.clone_from(&level.data);
            self.accepts_pass_through_args = level.accepts_pass_through_args;
            self.execute_on_cascade = level.execute_on_cascade;
        }
    }
}

impl CommandTree {
    async fn load_dir(&self, dir: &Path) -> Result<CommandSpec, ConfigError> {
        if let Some(spec) = self.cached_spec(dir) {
            trace!("Spec for {} served from cache", dir.display());
            return Ok(spec);
        }
        let spec = load_spec(dir, self.providers()).await?;
        self.cache_spec(dir.to_path_buf(), spec.clone());
        Ok(spec)
    }

    /// Load the spec of a single command level
    ///
    /// # Errors
    ///
    /// Returns any `ConfigError` raised by the spec loader.
    pub async fn load(&self, command: &str) -> Result<CommandSpec, ConfigError> {
        self.load_dir(&self.dir_for(command)).await
    }

    /// Load every level from the root down to `command`, in order.
    ///
    /// Each level is fully loaded before the next one is touched.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` raised while loading a level.
    pub async fn lineage(&self, command: &str) -> Result<Vec<Level>, ConfigError> {
        let mut levels = Vec::new();
        let mut path: Vec<&str> = Vec::new();
        let mut dir = self.root().to_path_buf();
        let pieces: Vec<&str> = command.split_whitespace().collect();
        for piece in std::iter::once(None).chain(pieces.into_iter().map(Some)) {
            if let Some(piece) = piece {
                path.push(piece);
                dir.push(piece);
            }
            let spec = self.load_dir(&dir).await?;
            levels.push(Level {
                command: path.join(" "),
                dir: dir.clone(),
                spec,
            });
        }
        Ok(levels)
    }

    /// The specification `command` is classified and validated against.
    ///
    /// Deterministic for unchanged spec files: merging the same command twice
    /// yields equal results.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` raised while loading a level.
    pub async fn merged_spec_for(&self, command: &str) -> Result<MergedSpec, ConfigError> {
        let levels = self.lineage(command).await?;
        let command = levels.last().map(|level| level.command.clone()).unwrap_or_default();
        let mut merged = MergedSpec::with_builtins(&command);
        let last = levels.len().saturating_sub(1);
        for (i, level) in levels.iter().enumerate() {
            merged.inherit(&level.spec, i == last);
        }
        debug!(
            "Merged spec for `{command}`: {} flags, {} options, data={}",
            merged.flags.len(),
            merged.options.len(),
            merged.data.is_some()
        );
        Ok(merged)
    }
}
