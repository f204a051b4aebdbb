use std::collections::BTreeMap;

use serde::Serialize;

use crate::args::classify::OrganizedArguments;
use crate::args::coerce::ArgValue;
use crate::commands::spec::{MergedSpec, is_builtin_flag};
use crate::error::RouterError;

/// The typed arguments handed to every handler of one invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputObject {
    pub command: String,
    /// Every declared flag, present or not
    pub flags: BTreeMap<String, bool>,
    /// Every declared option; `None` when it was not supplied
    pub options: BTreeMap<String, Option<ArgValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ArgValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_through_args: Option<Vec<String>>,
}

impl InputObject {
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn option(&self, name: &str) -> Option<&ArgValue> {
        self.options.get(name).and_then(Option::as_ref)
    }
}

/// Build the handler input for a classified invocation.
///
/// The built-in `help`/`version` flags are left out of `flags` unless
/// `include_builtin_flags` is set.
///
/// # Errors
///
/// Returns `RouterError::MissingRequiredOption` for the first absent required
/// option (in name order) and `RouterError::MissingRequiredData` when required
/// data was not supplied.
pub fn build_input(
    organized: &OrganizedArguments,
    merged: &MergedSpec,
    include_builtin_flags: bool,
) -> Result<InputObject, RouterError> {
    let flags = merged
        .flags
        .keys()
        .filter(|name| include_builtin_flags || !is_builtin_flag(name))
        .map(|name| (name.clone(), organized.has_flag(name)))
        .collect();

    let mut options = BTreeMap::new();
    for (name, option) in &merged.options {
        let value = organized.value_of(name).cloned();
        if option.required && value.is_none() {
            return Err(RouterError::MissingRequiredOption {
                option: name.clone(),
            });
        }
        options.insert(name.clone(), value);
    }

    let data = match &merged.data {
        Some(data_spec) => {
            if data_spec.required && organized.data.is_none() {
                return Err(RouterError::MissingRequiredData {
                    command: organized.command.clone(),
                });
            }
            organized.data.clone()
        }
        None => None,
    };

    Ok(InputObject {
        command: organized.command.clone(),
        flags,
        options,
        data,
        pass_through_args: organized.pass_through.clone(),
    })
}
