pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Notes CLI - provisioning and development helpers for the Notes API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Provision database role, database and schema")]
    Init {
        #[command(subcommand)]
        cmd: commands::init::InitCommands,
    },

    #[command(about = "Mint a token for a user id (development)")]
    Token(commands::token::TokenArgs),

    #[command(about = "Check server health status from the /health endpoint")]
    Health(commands::health::HealthArgs),
}

/// How command results are printed; `--json` switches every command to JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = if cli.json { OutputFormat::Json } else { OutputFormat::Text };

    match cli.command {
        Commands::Init { cmd } => commands::init::handle(cmd, output_format).await,
        Commands::Token(args) => commands::token::handle(args, output_format).await,
        Commands::Health(args) => commands::health::handle(args, output_format).await,
    }
}
