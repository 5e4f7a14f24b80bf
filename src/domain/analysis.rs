use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::detection::DetectionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(pub Uuid);

impl AnalysisId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for AnalysisId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One uploaded image together with the raw, unfiltered detector output.
/// Threshold changes only re-filter `detections`.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub id: AnalysisId,
    pub image: Arc<RgbImage>,
    pub detections: DetectionSet,
    pub infer_ms: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub id: AnalysisId,
    pub width: u32,
    pub height: u32,
    pub candidates: usize,
    pub infer_ms: f32,
}

impl From<&Analysis> for AnalysisSummary {
    fn from(a: &Analysis) -> Self {
        Self {
            id: a.id,
            width: a.image.width(),
            height: a.image.height(),
            candidates: a.detections.len(),
            infer_ms: a.infer_ms,
        }
    }
}
