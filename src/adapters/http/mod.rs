pub mod error;
pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use tower_http::trace::TraceLayer;
use crate::adapters::http::state::HttpState;

pub fn router(state: HttpState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/settings", get(routes::get_settings))
        .route("/api/analyses", post(routes::create_analysis))
        .route("/api/analyses/:id/report", get(routes::get_report))
        .route("/api/analyses/:id/report/download", get(routes::download_report))
        .route("/api/analyses/:id/original.png", get(routes::get_original))
        .route("/api/analyses/:id/annotated.png", get(routes::get_annotated))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
