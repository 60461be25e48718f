use clap::Args;
use serde_json::json;

use crate::auth::{issue_token, Claims};
use crate::cli::OutputFormat;
use crate::config;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "Auth service user id (roqUserId)")]
    pub user: String,
    #[arg(long, help = "Tenant id")]
    pub tenant: String,
    #[arg(long = "role", help = "Role name; repeat for several roles")]
    pub roles: Vec<String>,
    #[arg(long, help = "Lifetime in hours (defaults to the configured expiry)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let hours = args.hours.unwrap_or(security.jwt_expiry_hours);
    let claims = Claims::new(args.user, args.tenant, args.roles, hours);
    let token = issue_token(security, &claims)?;

    match output_format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "token": token, "claims": claims }))?
        ),
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
