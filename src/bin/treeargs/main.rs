mod inspect;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use treeargs::config_file::RouterConfig;
use treeargs::error::RouterError;
use treeargs::{load_config, report};

#[derive(Parser, Debug)]
#[command(
    name = "treeargs",
    version,
    about = "Route command-line arguments through a directory tree of commands"
)]
struct Cli {
    /// Path to config file (auto-detected if not specified)
    #[arg(short, long)]
    config: Option<String>,

    /// Command root, overriding the config file
    #[arg(long)]
    root: Option<PathBuf>,

    /// Log file path (log lines are also written to stderr)
    #[arg(long)]
    log_file: Option<String>,

    /// More log output; repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dispatch arguments against the command tree
    #[command(disable_help_flag = true)]
    Run(run::RunArgs),
    /// Print how arguments are classified, without dispatching
    #[command(disable_help_flag = true)]
    Parse(inspect::ParseArgs),
    /// Print the merged spec of a command
    Spec(inspect::SpecArgs),
    /// List every command in the tree
    Commands,
}

fn level(verbose: u8, config: &RouterConfig) -> LevelFilter {
    match (verbose, config.verbose) {
        (0, false) => LevelFilter::Warn,
        (0 | 1, _) => LevelFilter::Info,
        (2, _) => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), cli.root.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            report::print_error(&RouterError::from(e));
            return Ok(ExitCode::FAILURE);
        }
    };

    let log_file = cli
        .log_file
        .as_ref()
        .map(std::fs::File::create)
        .transpose()?;
    treeargs::logger::init(level(cli.verbose, &config), log_file);

    match cli.command {
        Commands::Run(ref args) => Ok(run::run(args, config).await),
        Commands::Parse(ref args) => inspect::parse(args, config).await,
        Commands::Spec(ref args) => inspect::spec(args, config).await,
        Commands::Commands => inspect::commands(config).await,
    }
}
