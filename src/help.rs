//! Help and version screens, rendered from the same merged spec the classifier uses

use std::fmt::Write;

use crate::commands::spec::MergedSpec;
use crate::commands::tree::CommandTree;
use crate::config_file::{ConfigError, RouterConfig};

/// A direct child command and its description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subcommand {
    pub name: String,
    pub description: Option<String>,
}

/// Child commands of `command`, with descriptions loaded from their specs
///
/// # Errors
///
/// Returns the first `ConfigError` raised while loading a child's spec.
pub async fn subcommands(tree: &CommandTree, command: &str) -> Result<Vec<Subcommand>, ConfigError> {
    let mut children = Vec::new();
    for name in tree.subcommands(command) {
        let path = format!("{command} {name}");
        let spec = tree.load(path.trim()).await?;
        children.push(Subcommand {
            name,
            description: spec.description,
        });
    }
    Ok(children)
}

fn push_section(out: &mut String, title: &str, rows: &[(String, String)]) {
    if rows.is_empty() {
        return;
    }
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
    let _ = write!(out, "\n\n{title}:");
    for (left, right) in rows {
        if right.is_empty() {
            let _ = write!(out, "\n  {left}");
        } else {
            let _ = write!(out, "\n  {left:<width$}  {right}");
        }
    }
}

fn details(description: Option<&String>, required: bool, accepts: Option<&Vec<String>>) -> String {
    let mut parts: Vec<String> = description.into_iter().cloned().collect();
    if required {
        parts.push("(required)".to_string());
    }
    if let Some(accepts) = accepts {
        parts.push(format!("[{}]", accepts.join(", ")));
    }
    parts.join(" ")
}

fn argument(name: &str, shorthand: Option<char>) -> String {
    match shorthand {
        Some(c) => format!("-{c}, --{name}"),
        None => format!("    --{name}"),
    }
}

/// Render the help screen for `merged`
#[must_use]
pub fn render(config: &RouterConfig, merged: &MergedSpec, subcommands: &[Subcommand]) -> String {
    let heading = format!("{} {}", config.name, merged.command).trim().to_string();
    let mut out = heading.clone();
    if let Some(description) = &merged.description {
        let _ = write!(out, "\n\n{description}");
    }

    let mut usage = format!("Usage: {heading}");
    if !subcommands.is_empty() {
        usage.push_str(" [command]");
    }
    if !merged.flags.is_empty() {
        usage.push_str(" [flags]");
    }
    if !merged.options.is_empty() {
        usage.push_str(" [options]");
    }
    if merged.accepts_pass_through_args {
        usage.push_str(" [-- args...]");
    }
    match &merged.data {
        Some(data) if data.required => usage.push_str(" <data>"),
        Some(_) => usage.push_str(" [data]"),
        None => {}
    }
    let _ = write!(out, "\n\n{usage}");

    let commands: Vec<_> = subcommands
        .iter()
        .map(|sub| (sub.name.clone(), sub.description.clone().unwrap_or_default()))
        .collect();
    push_section(&mut out, "Commands", &commands);

    let flags: Vec<_> = merged
        .flags
        .iter()
        .map(|(name, flag)| {
            (
                argument(name, flag.shorthand),
                flag.description.clone().unwrap_or_default(),
            )
        })
        .collect();
    push_section(&mut out, "Flags", &flags);

    let options: Vec<_> = merged
        .options
        .iter()
        .map(|(name, option)| {
            let value = option.value_type.as_deref().unwrap_or("value");
            (
                format!("{} <{value}>", argument(name, option.shorthand)),
                details(
                    option.description.as_ref(),
                    option.required,
                    option.accepts.as_ref(),
                ),
            )
        })
        .collect();
    push_section(&mut out, "Options", &options);

    if let Some(data) = &merged.data {
        let value = data.value_type.as_deref().unwrap_or("data");
        let row = (
            format!("<{value}>"),
            details(data.description.as_ref(), data.required, data.accepts.as_ref()),
        );
        push_section(&mut out, "Data", &[row]);
    }

    out.push('\n');
    out
}

/// Render the version line
#[must_use]
pub fn render_version(config: &RouterConfig) -> String {
    match &config.version {
        Some(version) => format!("{} {version}\n", config.name).trim_start().to_string(),
        None => format!("{}\n", config.name),
    }
}
