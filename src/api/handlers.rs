use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{CalibrationRecord, InteractionRecord, PreferenceProfile, Startup},
    services::{calibration, preferences, DEFAULT_RECOMMENDATION_COUNT},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub candidates: Vec<Startup>,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct Recommendation {
    /// Carries `recommendationScore`
    pub startup: Startup,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub score: u8,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CalibrationRequest {
    pub startup: Startup,
    pub rating: u8,
}

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub startup: Startup,
    pub interested: bool,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Get the investor's saved preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
) -> Json<PreferenceProfile> {
    Json(state.repository(&investor_id).load_preferences().await)
}

/// Replace the investor's preferences
pub async fn put_preferences(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
    Json(profile): Json<PreferenceProfile>,
) -> AppResult<Json<PreferenceProfile>> {
    let saved = preferences::save_preferences(&state.repository(&investor_id), profile).await?;
    Ok(Json(saved))
}

/// Demo startups rated during onboarding
pub async fn get_calibration_deck() -> Json<Vec<Startup>> {
    Json(calibration::calibration_deck())
}

/// Get the investor's calibration ratings
pub async fn get_calibration(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
) -> Json<Vec<CalibrationRecord>> {
    let records = state.repository(&investor_id).load_calibration().await;
    Json(records.records().to_vec())
}

/// Record a calibration rating
pub async fn post_calibration(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
    Json(request): Json<CalibrationRequest>,
) -> AppResult<(StatusCode, Json<CalibrationRecord>)> {
    let rating = calibration::parse_rating(request.rating)?;
    let record = calibration::record_calibration(
        &state.repository(&investor_id),
        &request.startup,
        rating,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Clear all calibration ratings
pub async fn delete_calibration(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
) -> AppResult<StatusCode> {
    calibration::reset_calibration(&state.repository(&investor_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rank candidate startups for the investor
pub async fn recommend(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> Json<Vec<Recommendation>> {
    let count = request.count.unwrap_or(DEFAULT_RECOMMENDATION_COUNT);
    tracing::info!(
        request_id = %request_id,
        investor_id = %investor_id,
        candidates = request.candidates.len(),
        count,
        "Processing recommendation request"
    );

    let engine = state.engine(&investor_id).await;
    let recommendations = engine
        .recommended_startups(&request.candidates, count)
        .into_iter()
        .map(|startup| Recommendation {
            reason: engine.recommendation_reason(&startup),
            startup,
        })
        .collect();

    Json(recommendations)
}

/// Score a single startup
pub async fn score(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
    Json(startup): Json<Startup>,
) -> Json<ScoreResponse> {
    let engine = state.engine(&investor_id).await;
    Json(ScoreResponse {
        score: engine.calculate_startup_score(&startup),
        reason: engine.recommendation_reason(&startup),
    })
}

/// Get the investor's swipe history
pub async fn get_interactions(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
) -> Json<Vec<InteractionRecord>> {
    let history = state.repository(&investor_id).load_interactions().await;
    Json(history.records().to_vec())
}

/// Record a swipe
pub async fn post_interaction(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<InteractionRequest>,
) -> (StatusCode, Json<InteractionRecord>) {
    let mut engine = state.engine(&investor_id).await;
    let record = engine
        .log_interaction(&request.startup, request.interested)
        .await;

    tracing::debug!(
        request_id = %request_id,
        investor_id = %investor_id,
        startup_id = %record.startup_id,
        "Swipe recorded"
    );

    (StatusCode::CREATED, Json(record))
}
