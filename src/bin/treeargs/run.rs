use std::process::ExitCode;

use clap::Args;

use treeargs::args::standardize::standardize;
use treeargs::commands::accepts::ProviderRegistry;
use treeargs::config_file::RouterConfig;
use treeargs::context::Context;
use treeargs::dispatch::{self, HandlerRegistry};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Arguments for the command tree, `--help` included
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Process exit status for a handler exit code; out-of-range codes become a plain failure
pub fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

/// Dispatch the arguments to the handler artifacts in the command tree.
pub async fn run(args: &RunArgs, config: RouterConfig) -> ExitCode {
    let tokens = standardize(args.args.iter().cloned(), 0);
    let mut context = Context::new(config, ProviderRegistry::new(), tokens);
    exit_code(dispatch::run(&mut context, &HandlerRegistry::new()).await)
}
