use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use classroom_backend::config::{Config, JwtConfig};
use classroom_backend::routes::build_router;
use classroom_backend::state::AppState;
use classroom_backend::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn store(&self) -> &Store {
        self.state.store()
    }
}

/// Builds the config directly so parallel tests never race on process env vars.
pub fn test_config(sled_path: String) -> Config {
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path,
        jwt: JwtConfig {
            access_secret: format!("integration-test-access-secret-{}", uuid::Uuid::new_v4()),
            refresh_secret: format!("integration-test-refresh-secret-{}", uuid::Uuid::new_v4()),
            access_expires_in_hours: 12,
            refresh_expires_in_hours: 8_760,
        },
        cors_origin: "http://localhost:5173".to_string(),
        demo_classroom: "demo".to_string(),
        metrics_utc_offset_minutes: 540,
    }
}

pub async fn spawn_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("classroom-test.sled");
    let config = test_config(sled_path.to_string_lossy().to_string());

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");
    store
        .ensure_classroom(&config.demo_classroom)
        .expect("demo classroom");

    let state = AppState::new(store, &config);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}
