//! Result Routes

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDateTime;
use pipeline::TrendPoint;
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiError, SharedState};

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub result_id: Uuid,
    pub trend_data: Vec<TrendPoint>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub message: String,
    /// Whether a stored result was discarded
    pub removed: bool,
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound(format!("Unknown result {id}")))
}

/// Trend table of a stored production result
pub async fn trend(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<TrendResponse>, ApiError> {
    let entry = state.results.get(&parse_id(&id)?)?;
    let window = entry.payload.window();
    Ok(Json(TrendResponse {
        result_id: entry.id,
        trend_data: entry.payload.trend,
        start_time: window.map(|(start, _)| start),
        end_time: window.map(|(_, end)| end),
    }))
}

/// Discard a stored result and its annotated file
pub async fn reset(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<ResetResponse>, ApiError> {
    let removed = match Uuid::parse_str(&id) {
        Ok(id) => state.results.remove(&id)?,
        Err(_) => false,
    };
    Ok(Json(ResetResponse {
        message: "Result reset".to_string(),
        removed,
    }))
}
