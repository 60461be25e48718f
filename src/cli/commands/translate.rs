use clap::Args;

use crate::cli::OutputFormat;
use crate::config;
use crate::entity;
use crate::query::{translate, QueryParams};

#[derive(Args, Debug)]
pub struct TranslateArgs {
    #[arg(help = "Route slug, e.g. startups")]
    pub resource: String,
    #[arg(default_value = "", help = "Query string, e.g. \"limit=5&order=created_at.desc\"")]
    pub query: String,
}

pub fn handle(args: TranslateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let entity = entity::by_route(&args.resource)
        .ok_or_else(|| anyhow::anyhow!("Unknown resource '{}'", args.resource))?;

    let params = QueryParams::parse(&args.query);
    let find_args = translate(&params, entity, &config::config().query)?;
    if let Err(err) = find_args.check_columns(entity) {
        eprintln!("warning: {}", err);
    }

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&find_args)?),
        OutputFormat::Text => println!("{}", serde_json::to_string(&find_args)?),
    }
    Ok(())
}
