//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// One field of a prediction or health payload
#[derive(Debug, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a rounded table
pub fn print_rows<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format confidence as percentage
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// Color confidence based on value
pub fn color_confidence(confidence: f64) -> String {
    let formatted = format_confidence(confidence);
    if confidence >= 0.8 {
        formatted.green().to_string()
    } else if confidence >= 0.6 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Color a service status or water quality label
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "good" | "baik" => status.green().to_string(),
        "normal" | "fair" | "degraded" | "unknown" => status.yellow().to_string(),
        "unhealthy" | "poor" | "buruk" | "perlu perhatian" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Format a service timestamp, with or without a UTC offset
pub fn format_timestamp(ts: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.to_string()
    }
}

fn is_confidence_key(key: &str) -> bool {
    key == "confidence" || key.ends_with("_confidence")
}

fn is_label_key(key: &str) -> bool {
    matches!(key, "quality" | "status" | "label")
}

/// Render one payload value for a table cell
pub fn format_field(key: &str, value: &Value) -> String {
    match value {
        Value::Number(n) if is_confidence_key(key) => n
            .as_f64()
            .map(color_confidence)
            .unwrap_or_else(|| n.to_string()),
        Value::String(s) if is_label_key(key) => color_status(s),
        Value::String(s) if key == "timestamp" => format_timestamp(s),
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

/// Flatten a JSON object into field rows; other values become one row
pub fn field_rows(payload: &Value) -> Vec<FieldRow> {
    match payload {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| FieldRow {
                field: key.clone(),
                value: format_field(key, value),
            })
            .collect(),
        other => vec![FieldRow {
            field: "value".to_string(),
            value: format_field("value", other),
        }],
    }
}

/// Pull the confidence out of a prediction payload, whatever its key
pub fn payload_confidence(payload: &Value) -> Option<f64> {
    payload
        .get("confidence")
        .or_else(|| payload.get("prediction_confidence"))
        .and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(0.92), "92%");
        assert_eq!(format_confidence(0.0), "0%");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp("2026-10-17T08:30:00Z"),
            "2026-10-17 08:30:00"
        );
        assert_eq!(
            format_timestamp("2026-10-17T08:30:00.123456"),
            "2026-10-17 08:30:00"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_field_rows_from_object() {
        colored::control::set_override(false);
        let rows = field_rows(&json!({
            "quality": "Baik",
            "recommendations": ["Keep aeration running", "Check pH weekly"],
            "description": null
        }));

        assert_eq!(rows.len(), 3);
        let recs = rows.iter().find(|r| r.field == "recommendations").unwrap();
        assert_eq!(recs.value, "Keep aeration running\nCheck pH weekly");
        let desc = rows.iter().find(|r| r.field == "description").unwrap();
        assert_eq!(desc.value, "-");
    }

    #[test]
    fn test_field_rows_from_scalar() {
        let rows = field_rows(&json!(42));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "42");
    }

    #[test]
    fn test_payload_confidence_aliases() {
        assert_eq!(payload_confidence(&json!({"confidence": 0.92})), Some(0.92));
        assert_eq!(
            payload_confidence(&json!({"prediction_confidence": 0.85})),
            Some(0.85)
        );
        assert_eq!(payload_confidence(&json!({"quality": "good"})), None);
    }
}
