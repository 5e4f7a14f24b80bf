use async_trait::async_trait;
use image::RgbImage;

use crate::domain::{
    analysis::{Analysis, AnalysisId},
    detection::DetectionSet,
    errors::DomainResult,
    model::{Device, ModelDescriptor, ModelResources},
};

/// Runs the pretrained model over one image. Returns every candidate,
/// with no score cutoff applied.
pub trait DetectorPort: Send + Sync {
    fn detect(&self, image: &RgbImage) -> DomainResult<DetectionSet>;
    fn device(&self) -> Device;
}

pub trait ImageDecoderPort: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> DomainResult<RgbImage>;
}

/// Draws retained detections on a copy of the image and encodes it as PNG.
pub trait RendererPort: Send + Sync {
    fn render(&self, image: &RgbImage, detections: &DetectionSet) -> DomainResult<Vec<u8>>;
    fn encode(&self, image: &RgbImage) -> DomainResult<Vec<u8>>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_resources(&self, resources: &ModelResources) -> DomainResult<ModelDescriptor>;
}

#[async_trait]
pub trait AnalysisStorePort: Send + Sync {
    async fn insert(&self, analysis: Analysis) -> DomainResult<()>;
    async fn get(&self, id: &AnalysisId) -> DomainResult<Analysis>;
}
