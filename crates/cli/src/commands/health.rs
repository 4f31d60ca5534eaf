//! Health and connection troubleshooting commands

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Value};
use wq_lib::{HealthStatus, PredictionClient, PredictionResult, SensorReading};

use crate::commands::predict::print_prediction;
use crate::output::{
    color_status, field_rows, format_confidence, payload_confidence, print_error, print_info,
    print_json, print_rows, print_success, OutputFormat,
};

/// Show prediction service health
pub async fn health(client: &PredictionClient, format: OutputFormat) -> Result<bool> {
    let status = client.health_check().await;

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Table => print_health(client.service_url(), &status),
    }

    Ok(status.is_healthy())
}

fn print_health(service_url: &str, status: &HealthStatus) {
    println!("{}", "Prediction Service Health".bold());
    println!("{}", "=".repeat(50));
    println!("Service: {}", service_url.cyan());
    println!("Status:  {}", color_status(status.status()));

    let mut detail = status.report().clone();
    detail.remove("status");
    if !detail.is_empty() {
        println!();
        print_rows(field_rows(&Value::Object(detail)));
    }
}

/// Connection self-test report
#[derive(Debug, Serialize)]
struct DiagnoseReport {
    service_url: String,
    checked_at: String,
    health: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    prediction: Option<PredictionResult>,
}

/// Reading used for the self-test prediction
fn sample_reading() -> SensorReading {
    SensorReading {
        ph: Some(json!(7.2)),
        temperature: Some(json!(28.5)),
        turbidity: Some(json!(15.3)),
        dissolved_oxygen: Some(json!(6.8)),
        ..Default::default()
    }
}

/// Probe the service, then request a prediction for a known-good reading
///
/// Stops after the health probe if the service is not reachable.
pub async fn diagnose(client: &PredictionClient, format: OutputFormat) -> Result<bool> {
    let checked_at = chrono::Utc::now();
    let table = matches!(format, OutputFormat::Table);

    if table {
        println!("{}", "Prediction Service Connection Test".bold());
        println!("{}", "=".repeat(50));
        println!("Service: {}", client.service_url().cyan());
        println!("Time:    {}", checked_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!();
        println!("{}", "1. Health check".bold());
    }

    let health = client.health_check().await;
    let reachable = health.error().is_none();

    if table {
        if reachable {
            print_success(&format!("Health check: {}", color_status(health.status())));
        } else {
            print_error("Health check failed");
            println!("  {}", health.error().unwrap_or_default());
            print_info("Is the prediction service running?");
            print_info(&format!("Check the service at {}", client.service_url()));
        }
    }

    let prediction = if reachable {
        if table {
            println!();
            println!("{}", "2. Sample prediction".bold());
        }
        let result = client.predict_water_quality(&sample_reading()).await;
        if table {
            print_prediction(&result);
            if let Some(payload) = result.payload() {
                let quality = payload
                    .get("quality")
                    .and_then(|q| q.as_str())
                    .unwrap_or("N/A");
                let confidence = payload_confidence(payload)
                    .map(format_confidence)
                    .unwrap_or_else(|| "N/A".to_string());
                println!("Quality: {}  Confidence: {}", quality, confidence);
            }
        }
        Some(result)
    } else {
        None
    };

    let ok = reachable && prediction.as_ref().is_some_and(PredictionResult::is_success);

    match format {
        OutputFormat::Json => print_json(&DiagnoseReport {
            service_url: client.service_url().to_string(),
            checked_at: checked_at.to_rfc3339(),
            health,
            prediction,
        })?,
        OutputFormat::Table => {
            println!();
            if ok {
                print_success("Connection test complete");
            } else {
                print_error("Connection test failed");
            }
        }
    }

    Ok(ok)
}
