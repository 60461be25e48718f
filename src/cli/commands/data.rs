use clap::Subcommand;
use serde_json::Value;

use crate::cli::utils::{output_success, output_value, read_stdin_json};
use crate::cli::OutputFormat;
use crate::client::{ApiClient, ListQuery};
use crate::entity;
use crate::models::Paginated;
use crate::query::QueryParams;

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "List records with pagination, ordering, search and filters")]
    List {
        #[arg(help = "Route slug, e.g. startups")]
        resource: String,
        #[arg(long, help = "Raw query string appended as-is")]
        query: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
        #[arg(long, help = "Sort key like created_at.desc; repeatable")]
        order: Vec<String>,
        #[arg(long, help = "Case-insensitive search across text fields")]
        search: Option<String>,
        #[arg(long, help = "Relation to include, or <relation>.count; repeatable")]
        relations: Vec<String>,
        #[arg(long, value_parser = parse_filter, help = "Equality filter field=value; repeatable")]
        filter: Vec<(String, String)>,
    },

    #[command(about = "Show one record")]
    Get {
        resource: String,
        id: String,
        #[arg(long, help = "Relation to include, or <relation>.count; repeatable")]
        relations: Vec<String>,
    },

    #[command(about = "Create a record from JSON on stdin")]
    Create { resource: String },

    #[command(about = "Update a record from JSON on stdin")]
    Update { resource: String, id: String },

    #[command(about = "Delete a record")]
    Delete { resource: String, id: String },
}

pub async fn handle(cmd: DataCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DataCommands::List { resource, query, limit, offset, order, search, relations, filter } => {
            check_resource(&resource)?;
            let mut params = query.as_deref().map(QueryParams::parse).unwrap_or_default();
            if let Some(limit) = limit {
                params.set("limit", limit.to_string());
            }
            if let Some(offset) = offset {
                params.set("offset", offset.to_string());
            }
            for o in order {
                params.push("order", o);
            }
            if let Some(search) = search {
                params.set("searchTerm", search);
            }
            for r in relations {
                params.push("relations", r);
            }
            for (field, value) in filter {
                params.push(field, value);
            }

            let page: Paginated<Value> = client.list_raw(&resource, &ListQuery::from(params)).await?;
            match output_format {
                OutputFormat::Json => output_value(output_format, &serde_json::to_value(&page)?),
                OutputFormat::Text => {
                    output_value(output_format, &Value::Array(page.data.clone()))?;
                    println!("({} of {})", page.data.len(), page.total_count);
                    Ok(())
                }
            }
        }
        DataCommands::Get { resource, id, relations } => {
            check_resource(&resource)?;
            let query = relations.iter().fold(ListQuery::new(), |q, r| match r.strip_suffix(".count") {
                Some(relation) => q.count(relation),
                None => q.include(r),
            });
            let record: Value = client.get_raw(&resource, &id, &query).await?;
            output_value(output_format, &record)
        }
        DataCommands::Create { resource } => {
            check_resource(&resource)?;
            let body = read_stdin_json()?;
            let created: Value = client.create_raw(&resource, &body).await?;
            let id = created.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
            output_success(output_format, &format!("Created {} {}", resource, id), created)
        }
        DataCommands::Update { resource, id } => {
            check_resource(&resource)?;
            let body = read_stdin_json()?;
            let updated: Value = client.update_raw(&resource, &id, &body).await?;
            output_success(output_format, &format!("Updated {} {}", resource, id), updated)
        }
        DataCommands::Delete { resource, id } => {
            check_resource(&resource)?;
            let deleted: Value = client.delete_raw(&resource, &id).await?;
            output_success(output_format, &format!("Deleted {} {}", resource, id), deleted)
        }
    }
}

fn check_resource(resource: &str) -> anyhow::Result<()> {
    if entity::by_route(resource).is_none() {
        anyhow::bail!("Unknown resource '{}' (see `orypto entities`)", resource);
    }
    Ok(())
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(format!("expected field=value, got '{}'", raw)),
    }
}
