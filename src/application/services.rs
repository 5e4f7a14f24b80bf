use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::{
    application::ports::{AnalysisStorePort, DetectorPort, ImageDecoderPort, RendererPort},
    domain::{
        analysis::{Analysis, AnalysisId, AnalysisSummary},
        detection::Threshold,
        errors::{DomainError, DomainResult},
        model::ThresholdControl,
        report::Report,
    },
};

pub const REPORT_FILE_NAME: &str = "tumor_detection_report.json";

/// Orquestador del flujo subida → inferencia → filtrado → informe.
/// La inferencia corre una sola vez por imagen; cambiar el umbral solo
/// vuelve a filtrar el conjunto de detecciones guardado.
#[derive(Clone)]
pub struct DetectionService {
    detector: Arc<dyn DetectorPort>,
    decoder: Arc<dyn ImageDecoderPort>,
    renderer: Arc<dyn RendererPort>,
    store: Arc<dyn AnalysisStorePort>,
    control: ThresholdControl,
}

impl DetectionService {
    pub fn new(
        detector: Arc<dyn DetectorPort>,
        decoder: Arc<dyn ImageDecoderPort>,
        renderer: Arc<dyn RendererPort>,
        store: Arc<dyn AnalysisStorePort>,
        control: ThresholdControl,
    ) -> Self {
        Self { detector, decoder, renderer, store, control }
    }

    pub fn control(&self) -> ThresholdControl {
        self.control
    }

    pub fn detector(&self) -> &Arc<dyn DetectorPort> {
        &self.detector
    }

    /// Decodifica la imagen subida, ejecuta el detector y guarda el
    /// resultado sin filtrar.
    pub async fn analyze(&self, upload: Vec<u8>) -> DomainResult<AnalysisSummary> {
        let decoder = self.decoder.clone();
        let detector = self.detector.clone();

        let analysis = tokio::task::spawn_blocking(move || -> DomainResult<Analysis> {
            let image = decoder.decode(&upload)?;
            let t_start = Instant::now();
            let detections = detector.detect(&image)?;
            let infer_ms = t_start.elapsed().as_secs_f32() * 1000.0;
            Ok(Analysis { id: AnalysisId::new(), image: Arc::new(image), detections, infer_ms })
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("analysis task aborted: {e}")))??;

        let summary = AnalysisSummary::from(&analysis);
        info!(
            "Analysis {}: {}x{} px, {} candidates in {:.1} ms",
            summary.id, summary.width, summary.height, summary.candidates, summary.infer_ms
        );
        self.store.insert(analysis).await?;
        Ok(summary)
    }

    /// Filtra las detecciones guardadas con el umbral pedido y arma el informe.
    pub async fn report(&self, id: &AnalysisId, requested: Option<f32>) -> DomainResult<(Threshold, Report)> {
        let threshold = self.control.resolve(requested);
        let analysis = self.store.get(id).await?;
        let report = Report::assemble(&analysis.detections.filter(threshold));
        Ok((threshold, report))
    }

    pub async fn report_document(&self, id: &AnalysisId, requested: Option<f32>) -> DomainResult<String> {
        let (_, report) = self.report(id, requested).await?;
        report
            .to_json_document()
            .map_err(|e| DomainError::OperationFailed(format!("report serialization: {e}")))
    }

    pub async fn annotated_png(&self, id: &AnalysisId, requested: Option<f32>) -> DomainResult<Vec<u8>> {
        let threshold = self.control.resolve(requested);
        let analysis = self.store.get(id).await?;
        let renderer = self.renderer.clone();

        tokio::task::spawn_blocking(move || {
            let kept = analysis.detections.filter(threshold);
            renderer.render(&analysis.image, &kept)
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("render task aborted: {e}")))?
    }

    pub async fn original_png(&self, id: &AnalysisId) -> DomainResult<Vec<u8>> {
        let analysis = self.store.get(id).await?;
        let renderer = self.renderer.clone();

        tokio::task::spawn_blocking(move || renderer.encode(&analysis.image))
            .await
            .map_err(|e| DomainError::OperationFailed(format!("encode task aborted: {e}")))?
    }
}
