use std::io::Read;

use serde_json::Value;

use crate::cli::OutputFormat;

/// Print a JSON value, pretty in JSON mode and compact per record in text mode
pub fn output_value(output_format: OutputFormat, value: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => match value {
            Value::Array(items) => {
                for item in items {
                    println!("{}", serde_json::to_string(item)?);
                }
            }
            other => println!("{}", serde_json::to_string_pretty(other)?),
        },
    }
    Ok(())
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Text => println!("✓ {}", message),
    }
    Ok(())
}

/// Read a JSON document from stdin
pub fn read_stdin_json() -> anyhow::Result<Value> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    parse_json_input(&input)
}

pub fn parse_json_input(input: &str) -> anyhow::Result<Value> {
    if input.trim().is_empty() {
        anyhow::bail!("expected a JSON document on stdin");
    }
    serde_json::from_str(input).map_err(|e| anyhow::anyhow!("invalid JSON input: {}", e))
}
