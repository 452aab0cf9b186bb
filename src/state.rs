use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{auth::TokenService, config::AppConfig, mail::MailQueue};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub tokens: TokenService,
    pub mailer: MailQueue,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        tokens: TokenService,
        mailer: MailQueue,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            db,
            tokens,
            mailer,
        })
    }
}
