pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::commands::estimate::EstimateArgs;

#[derive(Debug, Parser)]
#[command(
    name = "sentinel",
    about = "Sky Sentinel operator CLI",
    long_about = "Inspect configuration, check readiness, apply migrations, and request route price estimates.",
    after_help = "Examples:\n  sentinel doctor --json\n  sentinel config\n  sentinel estimate --origin SFO --destination JFK --dates \"October 2024\" --standard-price 1000"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, LLM provider readiness, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Ask the configured model for a typical fare on a route")]
    Estimate(EstimateArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Estimate(args) => commands::estimate::run(args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
