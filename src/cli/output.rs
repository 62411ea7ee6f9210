//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, RaglineArgs};
use crate::error::Result;
use crate::rag::TEXT_FIELD;
use crate::vector::SearchHit;

/// Result structure for init and insert.
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentAdditionResult {
    pub snapshot: String,
    pub documents_added: usize,
    pub total_documents: usize,
    pub ids: Vec<String>,
    pub duration_ms: u64,
}

/// Result structure for search operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub duration_ms: u64,
}

/// Index statistics together with their snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexStatsResult {
    pub snapshot: String,
    pub total_documents: usize,
    pub dimension: usize,
    pub next_id: u64,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &RaglineArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &RaglineArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    let Some(obj) = value.as_object() else {
        println!("{}", format_value(&value));
        return Ok(());
    };

    if let Some(answer) = obj.get("answer").and_then(|a| a.as_str()) {
        println!("Answer:");
        println!("═══════");
        println!("{answer}");
        println!();
    }

    let hits = obj
        .get("results")
        .or_else(|| obj.get("retrieved_documents"))
        .and_then(|h| h.as_array());
    match hits {
        Some(hits) => output_hits_human(hits),
        None => output_generic_human(&value),
    }

    if let Some(duration) = obj.get("duration_ms").and_then(|d| d.as_u64()) {
        println!();
        println!("Time: {duration}ms");
    }
    Ok(())
}

/// Output ranked documents in human format.
fn output_hits_human(hits: &[serde_json::Value]) {
    println!("Documents:");
    println!("══════════");

    if hits.is_empty() {
        println!("(none)");
    }

    for (i, hit) in hits.iter().enumerate() {
        println!();
        println!(
            "{}. {} (Score: {:.4})",
            i + 1,
            hit.get("id").and_then(|s| s.as_str()).unwrap_or("?"),
            hit.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0)
        );
        println!("─────────────");

        if let Some(metadata) = hit.get("metadata").and_then(|m| m.as_object()) {
            if let Some(text) = metadata.get(TEXT_FIELD).and_then(|t| t.as_str()) {
                println!("{text}");
            }
            for (key, value) in metadata {
                if key != TEXT_FIELD {
                    println!("  {key}: {}", format_value(value));
                }
            }
        }
    }
}

/// Output generic data in human format.
fn output_generic_human(value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                if key == "duration_ms" {
                    continue;
                }
                println!("{key}: {}", format_value(val));
            }
        }
        _ => println!("{}", format_value(value)),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &RaglineArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(
            format_value(&serde_json::Value::String("test".to_string())),
            "test"
        );
        assert_eq!(
            format_value(&serde_json::Value::Number(serde_json::Number::from(42))),
            "42"
        );
        assert_eq!(format_value(&serde_json::Value::Bool(false)), "false");
        assert_eq!(format_value(&serde_json::Value::Null), "null");
        assert_eq!(format_value(&serde_json::json!(["a", 1])), "[a, 1]");
    }
}
