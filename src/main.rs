use std::sync::Arc;
use anyhow::Context;
use clap::Parser;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

use tumor_detector::{
    adapters::{
        http::{router, state::HttpState},
        imaging::{decoder::RasterDecoder, renderer::BoxRenderer},
        onnx::{detector::OnnxDetector, model_catalog::OnnxModelCatalog},
        store::memory::InMemoryAnalysisStore,
    },
    application::{ports::{DetectorPort, ModelCatalogPort}, services::DetectionService},
    config::Args,
    domain::model::ThresholdControl,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logs (RUST_LOG=info por defecto)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    // 2. Validar recursos del modelo: si falta alguno, no arrancamos.
    let resources = args.resources();
    let descriptor = OnnxModelCatalog::new()
        .validate_resources(&resources)
        .await
        .context("model resources")?;

    // 3. Cargar el detector una sola vez para todo el proceso.
    let weights = resources.weights_path.clone();
    let params = descriptor.model.clone();
    let detector = tokio::task::spawn_blocking(move || OnnxDetector::shared(&weights, &params))
        .await?
        .context("loading detector")?;
    tracing::info!("🧠 Model loaded on: {}", detector.device());

    // 4. Adaptadores y caso de uso
    let renderer = BoxRenderer::new(descriptor.render.clone())
        .context("renderer")?
        .with_label(descriptor.primary_class());
    let service = Arc::new(DetectionService::new(
        detector,
        Arc::new(RasterDecoder),
        Arc::new(renderer),
        Arc::new(InMemoryAnalysisStore::new(args.cache_capacity)),
        ThresholdControl::default(),
    ));

    let state = HttpState {
        detection: service,
        class_names: descriptor.model.class_names.clone(),
    };

    // 5. Router de Axum + página estática
    let app = router(state, args.max_upload_bytes())
        .fallback_service(ServeDir::new(&args.static_dir));

    tracing::info!("🚀 Tumor detector listening on http://{}", args.bind);
    tracing::info!("📂 Static files served from '{}'", args.static_dir.display());

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
