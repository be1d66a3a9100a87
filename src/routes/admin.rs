//! Administrative triggers for the weekly house statistics cache.
//! Authentication is handled outside this service.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;

use crate::constants::is_known_house;
use crate::response::{ok, AppError};
use crate::state::{AppState, RefreshGuard};
use crate::stats::HouseRefreshOutcome;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/house-stats/refresh", post(refresh_all_houses))
        .route("/house-stats/:house/refresh", post(refresh_house))
        .route("/cache/stats", get(cache_stats))
        .route("/cache/clear", post(clear_cache))
}

fn claim_refresh(state: &AppState) -> Result<RefreshGuard, AppError> {
    state.try_begin_refresh().ok_or_else(|| {
        AppError::conflict(
            "REFRESH_IN_PROGRESS",
            "A house statistics refresh is already running",
        )
    })
}

async fn refresh_all_houses(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let guard = claim_refresh(&state)?;
    let service = state.house_stats().clone();

    let summary = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        service.calculate_all_house_stats()
    })
    .await
    .map_err(|e| AppError::internal(&format!("house stats refresh task failed: {e}")))?;

    tracing::info!(
        total_phases = summary.total_phases,
        failed = summary.houses.iter().filter(|h| h.error.is_some()).count(),
        "House stats refresh finished"
    );
    Ok(ok(summary))
}

async fn refresh_house(
    State(state): State<AppState>,
    Path(house): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !is_known_house(&house) {
        return Err(AppError::not_found(&format!("Unknown house: {house}")));
    }

    let guard = claim_refresh(&state)?;
    let service = state.house_stats().clone();
    let target = house.clone();

    let averages = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        service.calculate_and_cache_house_averages(&target)
    })
    .await
    .map_err(|e| AppError::internal(&format!("house stats refresh task failed: {e}")))??;

    Ok(ok(HouseRefreshOutcome {
        house,
        phase_count: averages.len(),
        averages,
        error: None,
    }))
}

async fn cache_stats(State(state): State<AppState>) -> impl IntoResponse {
    ok(state.house_stats().reference_cache().stats())
}

async fn clear_cache(State(state): State<AppState>) -> impl IntoResponse {
    state.house_stats().reference_cache().clear();
    ok(serde_json::json!({ "cleared": true }))
}
