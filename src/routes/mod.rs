pub mod admin;
pub mod health;
pub mod houses;

use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::middleware::request_id;
use crate::state::AppState;

/// None of the endpoints take a meaningful body.
const MAX_BODY_SIZE: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/houses", houses::router())
        .nest("/admin", admin::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}
