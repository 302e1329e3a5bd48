//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<AppContext>`.
//! Every fetch-path fault has already been converted to a
//! `FetchOutcome` by the orchestrator; the only errors produced here
//! are calculator input rejections.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::calc;
use crate::engine::{EnginePhase, FetchOrchestrator};
use crate::store::Repository;
use crate::types::{FetchOutcome, YieldCurveSnapshot};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct AppContext {
    pub orchestrator: FetchOrchestrator,
    pub repo: Repository,
    /// Default tax rate applied when a request omits one.
    pub tax_rate_percent: f64,
}

pub type AppState = Arc<AppContext>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LatestResponse {
    pub snapshot: YieldCurveSnapshot,
    /// None when the store has never been written (fallback data).
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub phase: String,
    pub server_time: String,
}

#[derive(Debug, Deserialize)]
pub struct PrimaryRequest {
    pub investment_amount: f64,
    pub tenor_days: u32,
    /// Falls back to the configured default.
    pub tax_rate_percent: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PrimaryResponse {
    pub breakdown: calc::PrimaryYieldBreakdown,
    /// Net returns at the other published tenors, for comparison.
    pub comparison: Vec<calc::TenorComparison>,
}

#[derive(Debug, Deserialize)]
pub struct SecondaryRequest {
    pub face_value: f64,
    pub original_yield_percent: f64,
    pub original_tenor_days: u32,
    pub holding_days: u32,
    pub market_yield_percent: f64,
    pub tax_rate_percent: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn reject(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse { error: msg.into() }))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health: liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/latest: the current snapshot (fallback if store is empty).
pub async fn get_latest(
    State(state): State<AppState>,
) -> Result<Json<LatestResponse>, (StatusCode, Json<ErrorResponse>)> {
    let snapshot = state.repo.read_latest().await.map_err(|e| {
        reject(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let last_modified = state
        .repo
        .last_modified()
        .await
        .ok()
        .flatten()
        .map(|ts| ts.to_rfc3339());

    Ok(Json(LatestResponse {
        snapshot,
        last_modified,
    }))
}

/// POST /api/refresh: user-triggered fetch. Always 200: the outcome
/// status carries the result classification for display.
pub async fn post_refresh(State(state): State<AppState>) -> Json<FetchOutcome> {
    Json(state.orchestrator.refresh().await)
}

/// GET /api/status: engine phase for the refresh button.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let phase = match state.orchestrator.phase() {
        EnginePhase::Idle => "IDLE",
        EnginePhase::Fetching => "FETCHING",
    };
    Json(StatusResponse {
        phase: phase.to_string(),
        server_time: chrono::Utc::now().to_rfc3339(),
    })
}

/// POST /api/calc/primary: hold-to-maturity return at a stored tenor.
pub async fn post_calc_primary(
    State(state): State<AppState>,
    Json(req): Json<PrimaryRequest>,
) -> Result<Json<PrimaryResponse>, (StatusCode, Json<ErrorResponse>)> {
    if req.investment_amount <= 0.0 {
        return Err(reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "investment amount must be positive",
        ));
    }

    let snapshot = state.repo.read_latest().await.map_err(|e| {
        reject(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let Some(yield_percent) = snapshot.yield_for(req.tenor_days) else {
        return Err(reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!(
                "no published yield for a {}-day tenor (available: {:?})",
                req.tenor_days,
                snapshot.tenors()
            ),
        ));
    };

    let tax = req.tax_rate_percent.unwrap_or(state.tax_rate_percent);
    let breakdown = calc::primary_yield(req.investment_amount, req.tenor_days, yield_percent, tax);
    let comparison = calc::compare_net_returns(&snapshot, req.investment_amount, tax)
        .into_iter()
        .filter(|c| c.tenor_days != req.tenor_days)
        .collect();

    Ok(Json(PrimaryResponse {
        breakdown,
        comparison,
    }))
}

/// POST /api/calc/secondary: early-sale economics.
pub async fn post_calc_secondary(
    State(state): State<AppState>,
    Json(req): Json<SecondaryRequest>,
) -> Result<Json<calc::SecondarySaleBreakdown>, (StatusCode, Json<ErrorResponse>)> {
    let tax = req.tax_rate_percent.unwrap_or(state.tax_rate_percent);
    calc::secondary_sale(
        req.face_value,
        req.original_yield_percent,
        req.original_tenor_days,
        req.holding_days,
        req.market_yield_percent,
        tax,
    )
    .map(Json)
    .map_err(|e| reject(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
}
