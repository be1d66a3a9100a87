use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::constants::HOUSES;
use crate::response::ok;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_houses))
        .route("/:house/averages", get(house_averages))
        .route("/:house/freshness", get(house_freshness))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FreshnessView {
    house: String,
    week_number: u32,
    year: i32,
    fresh: bool,
}

async fn list_houses() -> impl IntoResponse {
    ok(HOUSES)
}

/// Cached per-phase averages for the current week. Storage failures and
/// "not computed yet" both come back as an empty list.
async fn house_averages(
    State(state): State<AppState>,
    Path(house): Path<String>,
) -> impl IntoResponse {
    ok(state.house_stats().get_house_averages(&house))
}

async fn house_freshness(
    State(state): State<AppState>,
    Path(house): Path<String>,
) -> impl IntoResponse {
    let service = state.house_stats();
    let week = service.current_week();
    let fresh = service.has_current_week_stats(&house);
    ok(FreshnessView {
        house,
        week_number: week.week_number,
        year: week.year,
        fresh,
    })
}
