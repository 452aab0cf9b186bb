//! Shared wiring for unit and integration tests.

use std::sync::Arc;

use axum::Router;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

use crate::{
    auth::TokenService,
    config::AppConfig,
    mail::{LogTransport, MailQueue},
    routes::app,
    state::AppState,
};

pub const TEST_SECRET: &str = "contacts-test-secret";

/// Defaults with a signing secret and rate limiting switched off.
pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = TEST_SECRET.to_string();
    cfg.rate_limit.enabled = false;
    cfg
}

/// Must be called inside a tokio runtime; the mail worker is spawned here.
pub fn test_state(cfg: AppConfig, db: DatabaseConnection) -> Arc<AppState> {
    let tokens = TokenService::from_config(&cfg.auth).expect("test token service");
    let mailer = MailQueue::spawn(Arc::new(LogTransport), cfg.mail.queue_capacity);
    AppState::new(cfg, db, tokens, mailer)
}

pub fn test_app(state: Arc<AppState>) -> Router {
    app(state)
}

/// App backed by an empty mock database. Any query it runs will fail.
pub fn test_router() -> Router {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    test_app(test_state(test_config(), db))
}
