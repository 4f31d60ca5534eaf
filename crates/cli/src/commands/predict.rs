//! Single reading prediction command

use anyhow::Result;
use colored::Colorize;
use wq_lib::{PredictionClient, PredictionResult, SensorReading};

use crate::output::{
    field_rows, print_error, print_json, print_rows, print_success, print_warning, OutputFormat,
};

/// Predict water quality for one reading
///
/// Returns `false` when the service could not produce a prediction.
pub async fn predict(
    client: &PredictionClient,
    reading: SensorReading,
    format: OutputFormat,
) -> Result<bool> {
    let result = client.predict_water_quality(&reading).await;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => print_prediction(&result),
    }

    Ok(result.is_success())
}

/// Print a prediction result in table form
pub fn print_prediction(result: &PredictionResult) {
    match result {
        PredictionResult::Success { payload } => {
            print_success("Prediction received");
            println!("{}", "Water Quality".bold());
            print_rows(field_rows(payload));
        }
        PredictionResult::Failure {
            kind,
            message,
            fallback_recommended,
        } => {
            print_error(&format!("Prediction failed ({})", kind));
            println!("  {}", message);
            if *fallback_recommended {
                print_warning(
                    "Prediction service is degraded; use the rule-based classification instead",
                );
            }
        }
    }
}
