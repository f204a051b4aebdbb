//! Declarative command specifications, as written on disk and after resolution

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::commands::accepts::AcceptsSource;

pub const HELP_FLAG: &str = "help";
pub const VERSION_FLAG: &str = "version";

/// A boolean switch
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlagSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shorthand: Option<char>,
    #[serde(default)]
    pub cascades: bool,
}

/// A key/value argument. `A` is the accepts representation: an [`AcceptsSource`]
/// straight from the spec file, or the resolved list of accepted values.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(
    rename_all = "camelCase",
    deny_unknown_fields,
    bound(deserialize = "A: Deserialize<'de>")
)]
pub struct OptionSpec<A = Vec<String>> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shorthand: Option<char>,
    #[serde(default)]
    pub cascades: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepts: Option<A>,
}

impl<A> Default for OptionSpec<A> {
    fn default() -> Self {
        OptionSpec {
            description: None,
            shorthand: None,
            cascades: false,
            required: false,
            value_type: None,
            accepts: None,
        }
    }
}

/// Trailing free-form value accepted by a command
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(
    rename_all = "camelCase",
    deny_unknown_fields,
    bound(deserialize = "A: Deserialize<'de>")
)]
pub struct DataSpec<A = Vec<String>> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepts: Option<A>,
    /// Once data starts, every later token is data, even ones that look like flags
    #[serde(default)]
    pub ignore_flags_and_options: bool,
}

impl<A> Default for DataSpec<A> {
    fn default() -> Self {
        DataSpec {
            description: None,
            required: false,
            value_type: None,
            accepts: None,
            ignore_flags_and_options: false,
        }
    }
}

/// One node of the command tree
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(
    rename_all = "camelCase",
    deny_unknown_fields,
    bound(deserialize = "A: Deserialize<'de>")
)]
pub struct CommandSpec<A = Vec<String>> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub execute_on_cascade: bool,
    #[serde(default)]
    pub accepts_pass_through_args: bool,
    #[serde(default)]
    pub flags: BTreeMap<String, FlagSpec>,
    #[serde(default)]
    pub options: BTreeMap<String, OptionSpec<A>>,
    // A `data:` key with no value still declares data capability.
    #[serde(
        default,
        deserialize_with = "present_or_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<DataSpec<A>>,
}

impl<A> Default for CommandSpec<A> {
    fn default() -> Self {
        CommandSpec {
            description: None,
            execute_on_cascade: false,
            accepts_pass_through_args: false,
            flags: BTreeMap::new(),
            options: BTreeMap::new(),
            data: None,
        }
    }
}

/// A spec as it appears in a spec file, before dynamic accepts are resolved
pub type SpecFile = CommandSpec<AcceptsSource>;

fn present_or_empty<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
}

/// The specification a command path resolves to after walking root to leaf
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedSpec {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub execute_on_cascade: bool,
    pub accepts_pass_through_args: bool,
    pub flags: BTreeMap<String, FlagSpec>,
    pub options: BTreeMap<String, OptionSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DataSpec>,
}

/// `--name` or `-c` for shorthand `c`; no other dash forms
fn matches_argument(token: &str, name: &str, shorthand: Option<char>) -> bool {
    if token.strip_prefix("--") == Some(name) {
        return true;
    }
    let Some(short) = token.strip_prefix('-').filter(|rest| !rest.starts_with('-')) else {
        return false;
    };
    let mut chars = short.chars();
    shorthand.is_some_and(|c| chars.next() == Some(c) && chars.next().is_none())
}

impl MergedSpec {
    /// Seed for a merge: only the built-in flags
    #[must_use]
    pub fn with_builtins(command: &str) -> Self {
        let mut flags = BTreeMap::new();
        flags.insert(
            HELP_FLAG.to_string(),
            FlagSpec {
                description: Some("Show this help screen".to_string()),
                shorthand: Some('h'),
                cascades: false,
            },
        );
        flags.insert(
            VERSION_FLAG.to_string(),
            FlagSpec {
                description: Some("Show the program name and version".to_string()),
                shorthand: Some('v'),
                cascades: false,
            },
        );
        MergedSpec {
            command: command.to_string(),
            flags,
            ..Default::default()
        }
    }

    /// Finds the option a dashed token names, by full name or shorthand
    #[must_use]
    pub fn find_option(&self, token: &str) -> Option<(&str, &OptionSpec)> {
        self.options
            .iter()
            .find(|(name, spec)| matches_argument(token, name, spec.shorthand))
            .map(|(name, spec)| (name.as_str(), spec))
    }

    /// Finds the flag a dashed token names, by full name or shorthand
    #[must_use]
    pub fn find_flag(&self, token: &str) -> Option<&str> {
        self.flags
            .iter()
            .find(|(name, spec)| matches_argument(token, name, spec.shorthand))
            .map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn ignores_flags_after_data(&self) -> bool {
        self.data
            .as_ref()
            .is_some_and(|data| data.ignore_flags_and_options)
    }
}

#[must_use]
pub fn is_builtin_flag(name: &str) -> bool {
    name == HELP_FLAG || name == VERSION_FLAG
}
