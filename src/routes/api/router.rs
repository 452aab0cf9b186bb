use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{auth, contacts, users};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::router(state.clone()))
        .merge(users::router(state.clone()))
        .merge(contacts::router(state))
}
