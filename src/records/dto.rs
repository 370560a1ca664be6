use serde::Deserialize;
use time::Date;

/// Create/update payload for a health record. All fields are optional at the
/// wire level; what is actually required is enforced per operation by the
/// record engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    pub date: Option<Date>,
    pub body_temperature: Option<f64>,
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<i32>,
    pub water_intake: Option<i32>,
    pub sleep_duration: Option<f64>,
    pub stress_level: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}
