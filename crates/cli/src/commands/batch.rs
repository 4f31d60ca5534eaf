//! Batch prediction command

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::Value;
use std::path::Path;
use tabled::Tabled;
use wq_lib::{BatchResult, PredictionClient, SensorReading};

use crate::output::{
    color_confidence, color_status, payload_confidence, print_error, print_json, print_rows,
    print_success, OutputFormat,
};

/// Row for batch predictions table
#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Quality")]
    quality: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

/// Send every reading in `file` as one batch prediction
pub async fn predict_batch(
    client: &PredictionClient,
    file: &Path,
    format: OutputFormat,
) -> Result<bool> {
    let readings = load_readings(file)?;
    let result = client.predict_batch(&readings).await;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => match &result {
            BatchResult::Success { payload } => {
                print_success(&format!("Batch of {} readings predicted", readings.len()));
                match prediction_items(payload) {
                    Some(items) => {
                        let rows: Vec<BatchRow> = items
                            .iter()
                            .enumerate()
                            .map(|(index, item)| BatchRow {
                                index,
                                quality: item
                                    .get("quality")
                                    .and_then(Value::as_str)
                                    .map(color_status)
                                    .unwrap_or_else(|| "-".to_string()),
                                confidence: payload_confidence(item)
                                    .map(color_confidence)
                                    .unwrap_or_else(|| "-".to_string()),
                            })
                            .collect();
                        print_rows(rows);
                        println!("\nTotal: {} predictions", items.len());
                    }
                    None => print_json(payload)?,
                }
            }
            BatchResult::Failure { message } => {
                print_error(&format!("Batch prediction failed: {}", message));
                println!("  {}", "No fallback is applied to batch requests".dimmed());
            }
        },
    }

    Ok(result.is_success())
}

/// Read readings from a JSON array or a `{"readings": [...]}` object
pub fn load_readings(path: &Path) -> Result<Vec<SensorReading>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read readings file {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse readings file {}", path.display()))?;

    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match map.remove("readings") {
            Some(readings @ Value::Array(_)) => readings,
            _ => bail!("Expected a \"readings\" array in {}", path.display()),
        },
        _ => bail!("Expected a JSON array of readings in {}", path.display()),
    };

    serde_json::from_value(list).context("Invalid sensor reading in batch file")
}

/// Locate the per-reading results in a batch payload
///
/// The service answers either with a bare array or with
/// `{"predictions": [...], "total": n}`.
fn prediction_items(payload: &Value) -> Option<&Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("predictions").and_then(Value::as_array),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn test_load_readings_from_array() {
        let file = write_temp(r#"[{"ph": 7.2, "temperature": 28.5}, {"ph_level": 6.1}]"#);
        let readings = load_readings(file.path()).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].ph, Some(json!(7.2)));
        assert_eq!(readings[1].ph_level, Some(json!(6.1)));
    }

    #[test]
    fn test_load_readings_from_wrapped_object() {
        let file = write_temp(r#"{"readings": [{"dissolved_oxygen": 5.5, "pond_id": 1}]}"#);
        let readings = load_readings(file.path()).unwrap();

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].pond_id, Some(json!(1)));
    }

    #[test]
    fn test_load_readings_keeps_values_unvalidated() {
        let file = write_temp(r#"[{"ph_level": "7.20", "temperature": null, "ph": "high"}]"#);
        let readings = load_readings(file.path()).unwrap();

        assert_eq!(readings[0].ph, Some(json!("high")));
        assert_eq!(readings[0].ph_level, Some(json!("7.20")));
        assert_eq!(readings[0].temperature, Some(Value::Null));
    }

    #[test]
    fn test_load_readings_rejects_other_shapes() {
        assert!(load_readings(write_temp(r#"{"data": []}"#).path()).is_err());
        assert!(load_readings(write_temp("42").path()).is_err());
        assert!(load_readings(write_temp(r#"[42]"#).path()).is_err());
    }

    #[test]
    fn test_prediction_items_shapes() {
        let bare = json!([{"quality": "Baik"}]);
        assert_eq!(prediction_items(&bare).map(Vec::len), Some(1));

        let wrapped = json!({"predictions": [{"quality": "Baik"}, {"quality": "Normal"}], "total": 2});
        assert_eq!(prediction_items(&wrapped).map(Vec::len), Some(2));

        assert!(prediction_items(&json!({"total": 0})).is_none());
    }
}
