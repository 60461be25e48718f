pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;

#[derive(Parser)]
#[command(name = "orypto")]
#[command(about = "Orypto CLI - Command-line interface for the Orypto admin API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, env = "ORYPTO_API_URL", default_value = "http://localhost:3000", help = "API base URL")]
    pub url: String,

    #[arg(long, global = true, env = "ORYPTO_TOKEN", hide_env_values = true, help = "Session token (JWT)")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Issue a session token signed with the configured JWT secret")]
    Token(commands::token::TokenArgs),

    #[command(about = "Show how a query string is translated for an entity")]
    Translate(commands::translate::TranslateArgs),

    #[command(about = "List entities, route slugs and relations")]
    Entities,

    #[command(about = "Data operations against the REST API")]
    Data {
        #[command(subcommand)]
        cmd: commands::data::DataCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token(args) => commands::token::handle(args, output_format),
        Commands::Translate(args) => commands::translate::handle(args, output_format),
        Commands::Entities => commands::entities::handle(output_format),
        Commands::Data { cmd } => {
            let mut client = ApiClient::new(cli.url);
            if let Some(token) = cli.token {
                client = client.with_token(token);
            }
            commands::data::handle(cmd, &client, output_format).await
        }
    }
}
