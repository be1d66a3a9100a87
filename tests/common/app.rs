use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use house_stats_backend::clock::FixedClock;
use house_stats_backend::config::Config;
use house_stats_backend::routes::build_router;
use house_stats_backend::state::AppState;
use house_stats_backend::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<Store>,
    pub clock: Arc<FixedClock>,
    pub config: Config,
    _temp_dir: TempDir,
}

/// Wednesday of week 10 of 2025, away from any week boundary.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap()
}

pub fn test_config(sled_path: String) -> Config {
    // 直接构造 Config，避免 set_var 造成多线程测试环境变量竞态
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path,
        cors_origin: "http://localhost:5173".to_string(),
        reference_cache_ttl_secs: 900,
    }
}

pub fn open_store() -> (TempDir, Arc<Store>) {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("house-stats-test.sled");
    let store = Arc::new(Store::open(&sled_path.to_string_lossy()).expect("open store"));
    store.run_migrations().expect("run migrations");
    (temp_dir, store)
}

pub async fn spawn_test_app() -> TestApp {
    let (temp_dir, store) = open_store();
    let config = test_config(
        temp_dir
            .path()
            .join("house-stats-test.sled")
            .to_string_lossy()
            .to_string(),
    );
    let clock = Arc::new(FixedClock::new(test_now()));

    let state = AppState::new(store.clone(), clock.clone(), &config);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        store,
        clock,
        config,
        _temp_dir: temp_dir,
    }
}
