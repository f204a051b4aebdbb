//! Per-invocation state threaded through classification, help and dispatch

use log::debug;

use crate::args::classify::{OrganizedArguments, organize_with_spec};
use crate::args::input::{InputObject, build_input};
use crate::args::standardize;
use crate::commands::accepts::ProviderRegistry;
use crate::commands::spec::MergedSpec;
use crate::commands::tree::CommandTree;
use crate::config_file::RouterConfig;
use crate::error::RouterError;
use crate::suggest::{EditDistance, Suggester};

/// Everything one invocation needs, built once at entry.
///
/// Classification is memoized so the help screen and the dispatcher agree on
/// the same result without classifying twice; pass `force_recompute` to redo it.
/// The merged spec the classifier ended on is kept alongside.
#[derive(Debug)]
pub struct Context {
    config: RouterConfig,
    tree: CommandTree,
    suggester: Suggester,
    tokens: Vec<String>,
    organized: Option<OrganizedArguments>,
    merged: Option<MergedSpec>,
}

impl Context {
    /// `tokens` must already be standardized.
    #[must_use]
    pub fn new(config: RouterConfig, providers: ProviderRegistry, tokens: Vec<String>) -> Self {
        let tree = CommandTree::new(config.root.clone()).with_providers(providers);
        let suggester = Suggester::new(EditDistance, config.suggestion_threshold);
        Context {
            config,
            tree,
            suggester,
            tokens,
            organized: None,
            merged: None,
        }
    }

    /// Context for the current process's own arguments
    #[must_use]
    pub fn from_env(config: RouterConfig, providers: ProviderRegistry) -> Self {
        Self::new(config, providers, standardize::from_env())
    }

    #[must_use]
    pub fn with_suggester(mut self, suggester: Suggester) -> Self {
        self.suggester = suggester;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    #[must_use]
    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Classify the tokens, reusing an earlier result unless `force_recompute` is set.
    ///
    /// # Errors
    ///
    /// Returns the classification error; nothing is memoized in that case.
    pub async fn organized_arguments(
        &mut self,
        force_recompute: bool,
    ) -> Result<&OrganizedArguments, RouterError> {
        if force_recompute {
            self.organized = None;
            self.merged = None;
            self.tree.clear_cache();
        }
        let organized = match self.organized.take() {
            Some(organized) => organized,
            None => {
                debug!("Classifying {} tokens", self.tokens.len());
                let (organized, merged) =
                    organize_with_spec(&self.tree, &self.tokens, &self.suggester).await?;
                self.merged = Some(merged);
                organized
            }
        };
        Ok(self.organized.insert(organized))
    }

    /// Merged spec of the classified command
    ///
    /// # Errors
    ///
    /// Returns classification errors and spec loading errors.
    pub async fn merged_spec(&mut self, force_recompute: bool) -> Result<MergedSpec, RouterError> {
        let command = self.organized_arguments(force_recompute).await?.command.clone();
        if let Some(merged) = &self.merged
            && merged.command == command
        {
            return Ok(merged.clone());
        }
        let merged = self.tree.merged_spec_for(&command).await?;
        Ok(self.merged.insert(merged).clone())
    }

    /// Handler input for the classified command
    ///
    /// # Errors
    ///
    /// Returns classification errors, spec loading errors, and missing
    /// required options or data.
    pub async fn input(&mut self, force_recompute: bool) -> Result<InputObject, RouterError> {
        let merged = self.merged_spec(force_recompute).await?;
        let forward_builtin_flags = self.config.forward_builtin_flags;
        let organized = self.organized_arguments(false).await?;
        build_input(organized, &merged, forward_builtin_flags)
    }
}
