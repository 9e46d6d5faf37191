//! Download Route

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use std::io::ErrorKind;

use crate::{ApiError, SharedState};

/// Annotated CSV as an attachment
pub async fn download(State(state): State<SharedState>, Path(file_name): Path<String>) -> Result<Response, ApiError> {
    let path = state.results.file_path(&file_name)?;
    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ApiError::NotFound(format!("Not found: file {file_name}")),
        _ => ApiError::Internal(e.to_string()),
    })?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
    ];
    Ok((headers, bytes).into_response())
}
