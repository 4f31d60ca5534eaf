//! Sensor reading normalization

use crate::models::{PredictionRequest, SensorReading};

/// Map a sensor reading onto the canonical prediction request
///
/// `ph` takes precedence over `ph_level` whenever it holds a value, zero
/// included; an absent or `null` `ph` falls back to `ph_level`. Every other
/// field is copied as-is and missing values stay missing.
pub fn normalize(reading: &SensorReading) -> PredictionRequest {
    PredictionRequest {
        ph: reading
            .ph
            .clone()
            .filter(|ph| !ph.is_null())
            .or_else(|| reading.ph_level.clone()),
        temperature: reading.temperature.clone(),
        turbidity: reading.turbidity.clone(),
        dissolved_oxygen: reading.dissolved_oxygen.clone(),
        pond_id: reading.pond_id.clone(),
    }
}
