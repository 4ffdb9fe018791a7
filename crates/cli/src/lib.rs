pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "shotbot",
    about = "Shotbot operator CLI",
    long_about = "Apply shotbot migrations, inspect effective configuration, and replay stored histories through the scoring engine.",
    after_help = "Examples:\n  shotbot migrate\n  shotbot config\n  shotbot analyze \"-5,1730000000,1730000600\" --now 1730001000"
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
    #[command(about = "Segment and score a history given in the stored numeric encoding")]
    Analyze {
        #[arg(
            allow_hyphen_values = true,
            help = "Comma-separated codes: timestamps are shots, -N sets a limit, 0 is a reset"
        )]
        history: String,
        #[arg(long, help = "Analysis time as Unix seconds (defaults to the current time)")]
        now: Option<f64>,
        #[arg(long, help = "Session gap in seconds (defaults to 43200)")]
        gap_secs: Option<u64>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Analyze { history, now, gap_secs } => {
            commands::analyze::run(&history, now, gap_secs)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
