pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::commands::chat::ChatArgs;

#[derive(Debug, Parser)]
#[command(
    name = "taskdesk",
    about = "Taskdesk operator CLI",
    long_about = "Inspect configuration, check agent endpoints, list project tasks, and talk to a tool agent.",
    after_help = "Examples:\n  taskdesk doctor --json\n  taskdesk tasks --project AccQt\n  taskdesk chat --department TradeMan --tool RepoInfoAgent"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and the agent and channel endpoints derived from it")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Fetch the task list for a project")]
    Tasks {
        #[arg(long, help = "Project name, e.g. AccQt or Hakuna-Matata")]
        project: String,
    },
    #[command(about = "Open an interactive conversation with a tool agent")]
    Chat {
        #[arg(long)]
        department: String,
        #[arg(long)]
        tool: String,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        project: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Tasks { project } => commands::tasks::run(&project),
        Command::Chat { department, tool, role, project } => {
            commands::chat::run(&ChatArgs { department, tool, role, project })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
