pub mod commands;

use clap::{Parser, Subcommand};
use pollbot_core::config::LoadOptions;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pollbot",
    about = "Pollbot operator CLI",
    long_about = "Inspect configuration, check Slack readiness, print manifests, and post polls.",
    after_help = "Examples:\n  pollbot doctor --json\n  pollbot manifest\n  pollbot post --channel C123 --question \"Lunch?\" --option Pizza --option Sushi --option Salad"
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Config file to load; must exist")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and Slack token readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the polling function and workflow manifests as JSON")]
    Manifest,
    #[command(about = "Post a three-option poll to a channel using the configured bot token")]
    Post {
        #[arg(long, help = "Channel id to post the poll in")]
        channel: String,
        #[arg(long, help = "Question to poll")]
        question: String,
        #[arg(long = "option", required = true, help = "Poll option; pass exactly three times")]
        options: Vec<String>,
        #[arg(long, help = "User id credited as the poll author")]
        user: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let load_options = match cli.config {
        Some(path) => LoadOptions::from_path(path),
        None => LoadOptions::default(),
    };

    let result = match cli.command {
        Command::Config => commands::CommandResult::text(commands::config::run(&load_options)),
        Command::Doctor { json } => {
            commands::CommandResult::text(commands::doctor::run(&load_options, json))
        }
        Command::Manifest => commands::manifest::run(),
        Command::Post { channel, question, options, user } => commands::post::run(
            &load_options,
            commands::post::PostArgs { channel, question, options, user },
        ),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
