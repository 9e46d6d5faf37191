//! Upload Routes

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use pipeline::{MaintenanceTask, PredictionOutcome, TrendPoint};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::{ApiError, AppState, SharedState};

/// Multipart field carrying the CSV
pub const FILE_FIELD: &str = "file";

/// An accepted `.csv` upload
#[derive(Debug)]
pub struct CsvUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Response for the production path
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub message: String,
    pub result_id: Uuid,
    pub total_records: usize,
    pub unique_faults: Vec<String>,
    pub summary: BTreeMap<String, usize>,
    pub download_url: String,
    pub trend_data: Vec<TrendPoint>,
    pub maintenance: Vec<MaintenanceTask>,
}

/// Response for the simulator path; nothing is persisted
#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub message: String,
    pub total_records: usize,
    pub unique_faults: Vec<String>,
    pub summary: BTreeMap<String, usize>,
    pub maintenance: Vec<MaintenanceTask>,
    pub overridden_rows: usize,
    pub model_invoked: bool,
}

/// Text after the last `.` is `csv`, any case; a bare `.csv` qualifies
fn is_csv(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("csv"))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge(e.body_text())
    } else {
        ApiError::InvalidUpload(e.body_text())
    }
}

/// Pull the `file` field out of a multipart body
pub async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<CsvUpload, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::InvalidUpload(e.body_text()))?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(ApiError::InvalidUpload("No selected file".to_string()));
        }
        if !is_csv(&file_name) {
            return Err(ApiError::InvalidUpload("Invalid file format".to_string()));
        }
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(CsvUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::InvalidUpload("No file uploaded".to_string()))
}

/// Run blocking pipeline work off the async workers
async fn offload<T, F>(state: &SharedState, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, ApiError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| ApiError::Internal(format!("prediction task failed: {e}")))?
}

/// Label an upload with the production bundle and store the annotated file
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    info!("Prediction upload {} ({} bytes)", upload.file_name, upload.bytes.len());

    offload(&state, move |state| {
        let outcome = state.pipeline.predict(&upload.bytes)?;
        let annotated = outcome.annotated_csv()?;
        let entry = state
            .results
            .insert(&upload.file_name, &annotated, outcome.summary.clone())?;

        let PredictionOutcome {
            summary, maintenance, ..
        } = outcome;
        Ok(Json(PredictResponse {
            message: "Prediction completed".to_string(),
            result_id: entry.id,
            total_records: summary.total_records,
            unique_faults: summary.unique_faults,
            summary: summary.summary,
            download_url: format!("/api/v1/download/{}", entry.file_name),
            trend_data: summary.trend,
            maintenance,
        }))
    })
    .await
}

/// Label an upload with rule overrides and the simulator bundle
pub async fn simulate(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    info!("Simulation upload {} ({} bytes)", upload.file_name, upload.bytes.len());

    offload(&state, move |state| {
        let outcome = state.pipeline.simulate(&upload.bytes)?;
        Ok(Json(SimulateResponse {
            message: "Simulation completed".to_string(),
            total_records: outcome.summary.total_records,
            unique_faults: outcome.summary.unique_faults,
            summary: outcome.summary.summary,
            maintenance: outcome.maintenance,
            overridden_rows: outcome.overridden_rows,
            model_invoked: outcome.model_invoked,
        }))
    })
    .await
}
