mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;

use common::app::spawn_test_app;
use common::fixtures::{seed_completed_phase, seed_phases, seed_student, seed_timeline};
use common::http::{assert_json_error, assert_status_ok_json, request, response_json};

#[tokio::test]
async fn it_lists_the_three_houses() {
    let app = spawn_test_app().await;

    let resp = request(&app.app, Method::GET, "/api/houses", &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(
        body["data"],
        serde_json::json!(["Bageshree", "Malhar", "Bhairav"])
    );
}

#[tokio::test]
async fn it_averages_are_empty_until_refreshed() {
    let app = spawn_test_app().await;
    let phases = seed_phases(&app.store, 2);
    seed_timeline(&app.store, &phases[1], 5);
    let student = seed_student(&app.store, "Malhar", true);
    seed_completed_phase(&app.store, &student, &phases[0], 40, 9);

    let before = request(&app.app, Method::GET, "/api/houses/Malhar/averages", &[]).await;
    let (status, _, body) = response_json(before).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"], serde_json::json!([]));

    let refresh = request(
        &app.app,
        Method::POST,
        "/api/admin/house-stats/Malhar/refresh",
        &[],
    )
    .await;
    let (status, _, body) = response_json(refresh).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["house"], "Malhar");
    assert_eq!(body["data"]["phaseCount"], 2);
    assert!(body["data"]["error"].is_null());

    let after = request(&app.app, Method::GET, "/api/houses/Malhar/averages", &[]).await;
    let (_, _, body) = response_json(after).await;
    assert_eq!(
        body["data"],
        serde_json::json!([
            { "phaseLabel": "Phase 1", "averageDays": 9 },
            { "phaseLabel": "Phase 2", "averageDays": 0 }
        ])
    );
}

#[tokio::test]
async fn it_freshness_follows_the_week() {
    let app = spawn_test_app().await;
    seed_phases(&app.store, 1);

    let resp = request(&app.app, Method::GET, "/api/houses/Bhairav/freshness", &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["fresh"], false);
    assert_eq!(body["data"]["year"], 2025);
    assert_eq!(body["data"]["weekNumber"], 10);

    let refresh = request(&app.app, Method::POST, "/api/admin/house-stats/refresh", &[]).await;
    let (status, _, _) = response_json(refresh).await;
    assert_eq!(status, StatusCode::OK);

    let resp = request(&app.app, Method::GET, "/api/houses/Bhairav/freshness", &[]).await;
    let (_, _, body) = response_json(resp).await;
    assert_eq!(body["data"]["fresh"], true);

    app.clock.advance(Duration::days(7));
    let resp = request(&app.app, Method::GET, "/api/houses/Bhairav/freshness", &[]).await;
    let (_, _, body) = response_json(resp).await;
    assert_eq!(body["data"]["fresh"], false);
    assert_eq!(body["data"]["weekNumber"], 11);
}

#[tokio::test]
async fn it_unknown_house_reads_empty() {
    let app = spawn_test_app().await;

    let resp = request(&app.app, Method::GET, "/api/houses/Yaman/averages", &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn it_response_echoes_request_id() {
    let app = spawn_test_app().await;

    let resp = request(
        &app.app,
        Method::GET,
        "/api/houses",
        &[("x-request-id", "req-houses-1".to_string())],
    )
    .await;
    let (_, headers, _) = response_json(resp).await;
    assert_eq!(headers["x-request-id"], "req-houses-1");
}

#[tokio::test]
async fn it_unknown_route_is_json_with_trace_id() {
    let app = spawn_test_app().await;

    let resp = request(
        &app.app,
        Method::GET,
        "/api/nowhere",
        &[("x-request-id", "trace-404".to_string())],
    )
    .await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");
    assert_eq!(body["traceId"], "trace-404");
}
