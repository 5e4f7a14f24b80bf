use serde::{Deserialize, Serialize};

use super::detection::DetectionSet;

/// Serializable summary of the detections that survived the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub num_detections: usize,
    pub scores: Vec<f32>,
    pub boxes: Vec<[f32; 4]>,
}

impl Report {
    pub fn assemble(detections: &DetectionSet) -> Self {
        let (scores, boxes): (Vec<f32>, Vec<[f32; 4]>) = detections
            .iter()
            .map(|d| (d.score(), d.bbox().to_array()))
            .unzip();
        Self { num_detections: detections.len(), scores, boxes }
    }

    /// Pretty JSON document, two-space indented, as offered for download.
    pub fn to_json_document(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
