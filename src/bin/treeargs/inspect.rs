use std::process::ExitCode;

use clap::Args;
use serde_json::json;

use treeargs::args::standardize::standardize;
use treeargs::commands::accepts::ProviderRegistry;
use treeargs::commands::tree::CommandTree;
use treeargs::config_file::RouterConfig;
use treeargs::context::Context;
use treeargs::error::RouterError;
use treeargs::report;

#[derive(Args, Debug)]
pub struct ParseArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SpecArgs {
    /// Command path; empty for the root
    command: Vec<String>,
}

fn failed(err: &RouterError) -> ExitCode {
    report::print_error(err);
    ExitCode::FAILURE
}

/// Print the organized arguments and the handler input as JSON.
///
/// # Errors
///
/// Returns an error if the result cannot be serialized.
pub async fn parse(
    args: &ParseArgs,
    config: RouterConfig,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let tokens = standardize(args.args.iter().cloned(), 0);
    let mut context = Context::new(config, ProviderRegistry::new(), tokens);
    let organized = match context.organized_arguments(false).await {
        Ok(organized) => organized.clone(),
        Err(e) => return Ok(failed(&e)),
    };
    let input = match context.input(false).await {
        Ok(input) => input,
        Err(e) => return Ok(failed(&e)),
    };
    let output = json!({ "organized": organized, "input": input });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ExitCode::SUCCESS)
}

/// Print the merged spec of a command as JSON.
///
/// # Errors
///
/// Returns an error if the spec cannot be serialized.
pub async fn spec(
    args: &SpecArgs,
    config: RouterConfig,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let tree = CommandTree::new(config.root);
    match tree.merged_spec_for(&args.command.join(" ")).await {
        Ok(merged) => {
            println!("{}", serde_json::to_string_pretty(&merged)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(failed(&e.into())),
    }
}

/// List every command below the root with its description.
///
/// # Errors
///
/// Never fails on its own; broken specs are reported and end with a failure code.
pub async fn commands(config: RouterConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let tree = CommandTree::new(config.root);
    let commands = tree.all_commands();
    let width = commands.iter().map(String::len).max().unwrap_or(0);
    for command in commands {
        let spec = match tree.load(&command).await {
            Ok(spec) => spec,
            Err(e) => return Ok(failed(&e.into())),
        };
        match spec.description {
            Some(description) => println!("{command:<width$}  {description}"),
            None => println!("{command}"),
        }
    }
    Ok(ExitCode::SUCCESS)
}
