use serde::{Deserialize, Serialize};

use crate::domain::{
    model::{Device, ThresholdControl},
    report::Report,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThresholdQuery {
    pub threshold: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub threshold: f32,
    pub report: Report,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    pub device: Device,
    pub class_names: Vec<String>,
    pub threshold: ThresholdControl,
    pub report_file_name: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
