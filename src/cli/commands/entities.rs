use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::entity::{RelationKind, TenantScope, ENTITIES};

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let entities: Vec<Value> = ENTITIES
                .iter()
                .map(|e| {
                    json!({
                        "name": e.name,
                        "route": e.route,
                        "fields": e.fields.iter().map(|f| f.name).collect::<Vec<_>>(),
                        "relations": e.relations.iter().map(|r| json!({
                            "name": r.name,
                            "kind": kind_name(r.kind),
                            "foreign_key": r.foreign_key,
                        })).collect::<Vec<_>>(),
                        "tenant": tenant_description(&e.tenant),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entities)?);
        }
        OutputFormat::Text => {
            for e in ENTITIES {
                println!("{} (/api/{}) - tenant {}", e.name, e.route, tenant_description(&e.tenant));
                for r in e.relations {
                    println!("  {} {} via {}", kind_name(r.kind), r.name, r.foreign_key);
                }
            }
        }
    }
    Ok(())
}

fn kind_name(kind: RelationKind) -> &'static str {
    match kind {
        RelationKind::HasMany => "has_many",
        RelationKind::BelongsTo => "belongs_to",
    }
}

fn tenant_description(scope: &TenantScope) -> String {
    match scope {
        TenantScope::Column(column) => format!("column {}", column),
        TenantScope::Parent { foreign_key, parent } => format!("via {}.{}", parent, foreign_key),
    }
}
