use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::adapters::http::{error::ApiError, state::HttpState};
use crate::application::dto::{ReportResponse, SettingsResponse, ThresholdQuery};
use crate::application::ports::DetectorPort;
use crate::application::services::REPORT_FILE_NAME;
use crate::domain::{
    analysis::{AnalysisId, AnalysisSummary},
    errors::DomainError,
};

const UPLOAD_FIELD: &str = "image";
pub const UPLOAD_PROMPT: &str = "Upload an image to start.";

pub async fn get_settings(State(st): State<HttpState>) -> impl IntoResponse {
    Json(SettingsResponse {
        device: st.detection.detector().device(),
        class_names: st.class_names.clone(),
        threshold: st.detection.control(),
        report_file_name: REPORT_FILE_NAME,
    })
}

pub async fn create_analysis(
    State(st): State<HttpState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisSummary>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::InvalidInput(format!("multipart: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DomainError::InvalidInput(format!("reading upload: {e}")))?;
        if !bytes.is_empty() {
            upload = Some(bytes.to_vec());
        }
        break;
    }

    let Some(bytes) = upload else {
        return Err(DomainError::InvalidInput(UPLOAD_PROMPT.into()).into());
    };
    Ok(Json(st.detection.analyze(bytes).await?))
}

pub async fn get_report(
    State(st): State<HttpState>,
    Path(id): Path<AnalysisId>,
    Query(q): Query<ThresholdQuery>,
) -> Result<Json<ReportResponse>, ApiError> {
    let (threshold, report) = st.detection.report(&id, q.threshold).await?;
    Ok(Json(ReportResponse { threshold: threshold.value(), report }))
}

pub async fn download_report(
    State(st): State<HttpState>,
    Path(id): Path<AnalysisId>,
    Query(q): Query<ThresholdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let document = st.detection.report_document(&id, q.threshold).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{REPORT_FILE_NAME}\"")),
        ],
        document,
    ))
}

pub async fn get_original(
    State(st): State<HttpState>,
    Path(id): Path<AnalysisId>,
) -> Result<impl IntoResponse, ApiError> {
    let png = st.detection.original_png(&id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

pub async fn get_annotated(
    State(st): State<HttpState>,
    Path(id): Path<AnalysisId>,
    Query(q): Query<ThresholdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let png = st.detection.annotated_png(&id, q.threshold).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
