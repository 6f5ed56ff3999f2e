use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Preferences, SuggestEventsResponse},
};

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Suggests up to five venues or events for a group
pub async fn suggest_events(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<Preferences>, JsonRejection>,
) -> AppResult<Json<SuggestEventsResponse>> {
    let Json(prefs) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    prefs.validate()?;

    tracing::info!(
        request_id = %request_id,
        location = %prefs.location,
        vibe = %prefs.vibe,
        event_type = %prefs.event_type,
        refresh_level = prefs.refresh_level(),
        "Processing suggestion request"
    );

    let suggestions = state.suggestions.suggest(&prefs).await?;

    tracing::info!(
        request_id = %request_id,
        count = suggestions.len(),
        "Suggestions ready"
    );

    Ok(Json(SuggestEventsResponse { suggestions }))
}
