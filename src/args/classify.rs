//! Single left-to-right classification of standardized tokens

use std::path::PathBuf;

use log::{debug, trace};
use serde::Serialize;

use crate::args::coerce::{ArgValue, coerce_value};
use crate::args::standardize::PASS_THROUGH_MARKER;
use crate::commands::spec::MergedSpec;
use crate::commands::tree::CommandTree;
use crate::config_file::ConfigError;
use crate::error::RouterError;
use crate::suggest::Suggester;

/// What the raw tokens of one invocation turned out to be
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizedArguments {
    /// Space-joined command path
    pub command: String,
    pub flags: Vec<String>,
    /// Option names, index-aligned with `values`
    pub options: Vec<String>,
    pub values: Vec<ArgValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ArgValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_through: Option<Vec<String>>,
}

impl OrganizedArguments {
    #[must_use]
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|flag| flag == name)
    }

    /// Value of the first occurrence of option `name`
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<&ArgValue> {
        self.options
            .iter()
            .position(|option| option == name)
            .and_then(|index| self.values.get(index))
    }
}

/// An option whose value is the next token
#[derive(Debug)]
struct PendingOption {
    name: String,
    accepts: Option<Vec<String>>,
    value_type: Option<String>,
}

#[derive(Debug)]
enum State {
    ExpectingToken,
    ExpectingOptionValue(PendingOption),
    PassThroughCollecting,
}

struct Classification<'a> {
    tree: &'a CommandTree,
    path: Vec<String>,
    prefix: PathBuf,
    /// Sticky: once a token fails to extend the path, no later token can
    reached_data: bool,
    state: State,
    data: Vec<String>,
    organized: OrganizedArguments,
    /// Merged spec for the current path; replaced whenever the path grows
    spec: Option<MergedSpec>,
}

impl<'a> Classification<'a> {
    fn new(tree: &'a CommandTree) -> Self {
        Classification {
            tree,
            path: Vec::new(),
            prefix: tree.root().to_path_buf(),
            reached_data: false,
            state: State::ExpectingToken,
            data: Vec::new(),
            organized: OrganizedArguments::default(),
            spec: None,
        }
    }

    fn command(&self) -> String {
        self.path.join(" ")
    }

    /// Options and flags differ per level, so the spec follows the path as it grows.
    async fn current_spec(&mut self) -> Result<&MergedSpec, ConfigError> {
        let command = self.command();
        let spec = match self.spec.take() {
            Some(spec) if spec.command == command => spec,
            _ => self.tree.merged_spec_for(&command).await?,
        };
        Ok(self.spec.insert(spec))
    }

    async fn feed(&mut self, token: &str) -> Result<(), RouterError> {
        match std::mem::replace(&mut self.state, State::ExpectingToken) {
            State::PassThroughCollecting => {
                self.organized
                    .pass_through
                    .get_or_insert_with(Vec::new)
                    .push(token.to_string());
                self.state = State::PassThroughCollecting;
            }
            State::ExpectingOptionValue(pending) => {
                let value = coerce_value(
                    &pending.name,
                    token,
                    pending.accepts.as_deref(),
                    pending.value_type.as_deref(),
                )?;
                trace!("Option `{}` = {value}", pending.name);
                self.organized.options.push(pending.name);
                self.organized.values.push(value);
            }
            State::ExpectingToken => self.classify(token).await?,
        }
        Ok(())
    }

    async fn classify(&mut self, token: &str) -> Result<(), RouterError> {
        if self.reached_data && self.current_spec().await?.ignores_flags_after_data() {
            self.data.push(token.to_string());
            return Ok(());
        }

        if token == PASS_THROUGH_MARKER {
            if !self.current_spec().await?.accepts_pass_through_args {
                return Err(RouterError::PassThroughNotSupported {
                    command: self.command(),
                });
            }
            trace!("Collecting pass-through arguments");
            self.organized.pass_through = Some(Vec::new());
            self.state = State::PassThroughCollecting;
            return Ok(());
        }

        if token.starts_with('-') {
            return self.classify_dashed(token).await;
        }

        if !self.reached_data {
            let resolution = self.tree.resolve(&self.prefix, token);
            if resolution.is_command {
                trace!("Command segment `{token}`");
                self.path.push(token.to_string());
                self.prefix = resolution.new_prefix;
                return Ok(());
            }
            self.reached_data = true;
        }
        self.data.push(token.to_string());
        Ok(())
    }

    async fn classify_dashed(&mut self, token: &str) -> Result<(), RouterError> {
        let spec = self.current_spec().await?;
        if let Some((name, option)) = spec.find_option(token) {
            self.state = State::ExpectingOptionValue(PendingOption {
                name: name.to_string(),
                accepts: option.accepts.clone(),
                value_type: option.value_type.clone(),
            });
            return Ok(());
        }
        if let Some(flag) = spec.find_flag(token) {
            let flag = flag.to_string();
            trace!("Flag `{flag}`");
            self.organized.flags.push(flag);
            return Ok(());
        }
        Err(RouterError::UnrecognizedArgument {
            argument: token.to_string(),
            command: self.command(),
        })
    }

    async fn finish(
        mut self,
        suggester: &Suggester,
    ) -> Result<(OrganizedArguments, MergedSpec), RouterError> {
        if let State::ExpectingOptionValue(pending) = &self.state {
            return Err(RouterError::MissingOptionValue {
                option: pending.name.clone(),
            });
        }
        let command = self.command();
        if !self.data.is_empty() {
            let data = self.data.join(" ");
            let tree = self.tree;
            let spec = self.current_spec().await?;
            let Some(data_spec) = &spec.data else {
                let candidates = tree.all_commands();
                let suggestion = suggester
                    .suggest(&format!("{command} {data}"), &candidates)
                    .map(ToString::to_string);
                return Err(RouterError::UnexpectedData {
                    command,
                    data,
                    suggestion,
                });
            };
            let value = coerce_value(
                "data",
                &data,
                data_spec.accepts.as_deref(),
                data_spec.value_type.as_deref(),
            )?;
            self.organized.data = Some(value);
        }
        self.current_spec().await?;
        let spec = self.spec.take().unwrap_or_default();
        self.organized.command = command;
        Ok((self.organized, spec))
    }
}

/// Classify standardized tokens against the command tree.
///
/// Fails on the first token that cannot be classified.
///
/// # Errors
///
/// Returns the `RouterError` describing the first invalid token, or any
/// `ConfigError` raised while loading the specs along the way.
pub async fn organize_arguments(
    tree: &CommandTree,
    tokens: &[String],
    suggester: &Suggester,
) -> Result<OrganizedArguments, RouterError> {
    Ok(organize_with_spec(tree, tokens, suggester).await?.0)
}

/// Like [`organize_arguments`], also returning the merged spec of the
/// classified command.
///
/// # Errors
///
/// Same as [`organize_arguments`].
pub async fn organize_with_spec(
    tree: &CommandTree,
    tokens: &[String],
    suggester: &Suggester,
) -> Result<(OrganizedArguments, MergedSpec), RouterError> {
    let mut classification = Classification::new(tree);
    for token in tokens {
        classification.feed(token).await?;
    }
    let (organized, spec) = classification.finish(suggester).await?;
    debug!(
        "Organized arguments: command=`{}` flags={:?} options={:?}",
        organized.command, organized.flags, organized.options
    );
    Ok((organized, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_command(root: &Path, path: &[&str], spec: &str) {
        let dir = path.iter().fold(root.to_path_buf(), |dir, p| dir.join(p));
        fs::create_dir_all(&dir).unwrap();
        let name = path.last().copied().unwrap_or("pizza");
        fs::write(dir.join(format!("{name}.sh")), "").unwrap();
        fs::write(dir.join("spec.yaml"), spec).unwrap();
    }

    fn tree() -> (tempfile::TempDir, CommandTree) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("pizza");
        write_command(
            &root,
            &[],
            r"
flags:
  quiet:
    shorthand: q
    cascades: true
options:
  delivery-zip-code:
    cascades: true
",
        );
        write_command(
            &root,
            &["order"],
            r"
acceptsPassThroughArgs: true
options:
  slices:
    shorthand: s
    type: integer
  tip:
    type: float
data:
  description: What to order
",
        );
        write_command(&root, &["order", "dine-in"], "{}\n");
        write_command(
            &root,
            &["echo"],
            r"
flags:
  loud: {}
data:
  ignoreFlagsAndOptions: true
",
        );
        write_command(&root, &["count"], "data:\n  type: integer\n");
        write_command(
            &root,
            &["bake"],
            r"
options:
  minutes:
    type: decimal
data:
  type: number
",
        );
        (dir, CommandTree::new(root))
    }

    async fn organize(tree: &CommandTree, tokens: &[&str]) -> Result<OrganizedArguments, RouterError> {
        let tokens: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        organize_arguments(tree, &tokens, &Suggester::default()).await
    }

    #[tokio::test]
    async fn test_empty_input_is_root() {
        let (_dir, tree) = tree();
        let organized = organize(&tree, &[]).await.unwrap();
        assert_eq!(organized, OrganizedArguments::default());
    }

    #[tokio::test]
    async fn test_options_flags_and_data() {
        let (_dir, tree) = tree();
        let organized = organize(
            &tree,
            &["-q", "order", "--slices", "3", "--tip", ".5", "two", "large"],
        )
        .await
        .unwrap();
        assert_eq!(organized.command, "order");
        assert_eq!(organized.flags, vec!["quiet"]);
        assert_eq!(organized.options, vec!["slices", "tip"]);
        assert_eq!(
            organized.values,
            vec![ArgValue::Integer(3), ArgValue::Float(0.5)]
        );
        assert_eq!(organized.data, Some(ArgValue::Text("two large".to_string())));
        assert_eq!(organized.value_of("tip"), Some(&ArgValue::Float(0.5)));
    }

    #[tokio::test]
    async fn test_option_value_taken_verbatim() {
        let (_dir, tree) = tree();
        let organized = organize(&tree, &["--delivery-zip-code", "--quiet"])
            .await
            .unwrap();
        assert_eq!(organized.options, vec!["delivery-zip-code"]);
        assert_eq!(organized.values, vec![ArgValue::Text("--quiet".to_string())]);
        assert!(organized.flags.is_empty());
    }

    #[tokio::test]
    async fn test_child_options_invisible_before_segment() {
        let (_dir, tree) = tree();
        let result = organize(&tree, &["--slices", "2", "order"]).await;
        match result {
            Err(RouterError::UnrecognizedArgument { argument, command }) => {
                assert_eq!(argument, "--slices");
                assert_eq!(command, "");
            }
            other => panic!("Expected UnrecognizedArgument, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_command_path_never_resumes_after_data() {
        let (_dir, tree) = tree();
        let organized = organize(&tree, &["order", "pepperoni", "dine-in"])
            .await
            .unwrap();
        assert_eq!(organized.command, "order");
        assert_eq!(
            organized.data,
            Some(ArgValue::Text("pepperoni dine-in".to_string()))
        );
    }

    #[tokio::test]
    async fn test_flag_between_data_tokens() {
        let (_dir, tree) = tree();
        let organized = organize(&tree, &["order", "two", "-q", "large"])
            .await
            .unwrap();
        assert_eq!(organized.flags, vec!["quiet"]);
        assert_eq!(organized.data, Some(ArgValue::Text("two large".to_string())));
    }

    #[tokio::test]
    async fn test_ignore_flags_after_data() {
        let (_dir, tree) = tree();
        let organized = organize(&tree, &["echo", "--loud", "hello", "--loud", "-q", "--"])
            .await
            .unwrap();
        assert_eq!(organized.flags, vec!["loud"]);
        assert_eq!(
            organized.data,
            Some(ArgValue::Text("hello --loud -q --".to_string()))
        );
    }

    #[tokio::test]
    async fn test_pass_through() {
        let (_dir, tree) = tree();
        let organized = organize(&tree, &["order", "-s", "1", "--", "--raw", "x=y"])
            .await
            .unwrap();
        assert_eq!(
            organized.pass_through,
            Some(vec!["--raw".to_string(), "x=y".to_string()])
        );
        assert_eq!(organized.data, None);

        let organized = organize(&tree, &["order", "--"]).await.unwrap();
        assert_eq!(organized.pass_through, Some(vec![]));
    }

    #[tokio::test]
    async fn test_pass_through_not_supported() {
        let (_dir, tree) = tree();
        let result = organize(&tree, &["order", "dine-in", "--", "--flag"]).await;
        match result {
            Err(RouterError::PassThroughNotSupported { command }) => {
                assert_eq!(command, "order dine-in");
            }
            other => panic!("Expected PassThroughNotSupported, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_option_value() {
        let (_dir, tree) = tree();
        let result = organize(&tree, &["order", "--slices"]).await;
        assert!(matches!(
            result,
            Err(RouterError::MissingOptionValue { option }) if option == "slices"
        ));
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let (_dir, tree) = tree();
        let result = organize(&tree, &["order", "--slices", "2.5"]).await;
        assert!(matches!(result, Err(RouterError::TypeMismatch { .. })));
    }

    #[tokio::test]
    async fn test_unexpected_data_suggests_command() {
        let (_dir, tree) = tree();
        let result = organize(&tree, &["ordr"]).await;
        match result {
            Err(RouterError::UnexpectedData {
                command,
                data,
                suggestion,
            }) => {
                assert_eq!(command, "");
                assert_eq!(data, "ordr");
                assert_eq!(suggestion.as_deref(), Some("order"));
            }
            other => panic!("Expected UnexpectedData, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dot_is_never_a_command() {
        let (_dir, tree) = tree();
        let organized = organize(&tree, &["order", "."]).await.unwrap();
        assert_eq!(organized.command, "order");
        assert_eq!(organized.data, Some(ArgValue::Text(".".to_string())));
    }

    #[tokio::test]
    async fn test_data_coerced_by_declared_type() {
        let (_dir, tree) = tree();
        let organized = organize(&tree, &["count", "12"]).await.unwrap();
        assert_eq!(organized.command, "count");
        assert_eq!(organized.data, Some(ArgValue::Integer(12)));

        for tokens in [&["count", "1", "2"][..], &["count", "x"][..]] {
            match organize(&tree, tokens).await {
                Err(RouterError::TypeMismatch {
                    name,
                    value,
                    expected,
                }) => {
                    assert_eq!(name, "data");
                    assert_eq!(value, tokens[1..].join(" "));
                    assert_eq!(expected, "integer");
                }
                other => panic!("Expected TypeMismatch, got: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_declared_type_is_a_config_error() {
        let (_dir, tree) = tree();
        match organize(&tree, &["bake", "--minutes", "12"]).await {
            Err(RouterError::Configuration(ConfigError::UnknownType { name, value })) => {
                assert_eq!(name, "minutes");
                assert_eq!(value, "decimal");
            }
            other => panic!("Expected UnknownType, got: {other:?}"),
        }
        match organize(&tree, &["bake", "3"]).await {
            Err(RouterError::Configuration(ConfigError::UnknownType { name, value })) => {
                assert_eq!(name, "data");
                assert_eq!(value, "number");
            }
            other => panic!("Expected UnknownType, got: {other:?}"),
        }
    }
}
