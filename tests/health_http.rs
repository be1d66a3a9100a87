mod common;

use axum::http::{Method, StatusCode};

use common::app::spawn_test_app;
use common::http::{request, response_json};

#[tokio::test]
async fn it_health_live_and_ready() {
    let app = spawn_test_app().await;

    let live = request(&app.app, Method::GET, "/health/live", &[]).await;
    let (live_status, _, _) = response_json(live).await;
    assert_eq!(live_status, StatusCode::OK);

    let ready = request(&app.app, Method::GET, "/health/ready", &[]).await;
    let (ready_status, _, _) = response_json(ready).await;
    assert_eq!(ready_status, StatusCode::OK);
}

#[tokio::test]
async fn it_health_reports_refresh_state() {
    let app = spawn_test_app().await;

    let resp = request(&app.app, Method::GET, "/health", &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["refreshRunning"], false);

    let _guard = app.state.try_begin_refresh().expect("claim");
    let resp = request(&app.app, Method::GET, "/health", &[]).await;
    let (_, _, body) = response_json(resp).await;
    assert_eq!(body["refreshRunning"], true);
}

#[tokio::test]
async fn it_health_database_is_ok() {
    let app = spawn_test_app().await;

    let db = request(&app.app, Method::GET, "/health/database", &[]).await;
    let (status, _, body) = response_json(db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthy"], true);
}
