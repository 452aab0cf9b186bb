use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::entities::user,
    middleware::{CurrentUser, ValidatedJson},
    response::{ApiResult, JsonApiResponse},
    services::ServiceContext,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub confirmed: bool,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            confirmed: user.confirmed,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AvatarBody {
    #[validate(url)]
    pub avatar_url: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users/me", get(me))
        .route("/users/avatar", patch(update_avatar))
        .with_state(state)
}

async fn me(CurrentUser(user): CurrentUser) -> ApiResult<UserResponse> {
    JsonApiResponse::ok(user.into())
}

async fn update_avatar(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(body): ValidatedJson<AvatarBody>,
) -> ApiResult<UserResponse> {
    let service = ServiceContext::from_state(state.as_ref()).user();
    let updated = service.update_avatar(&user.id, &body.avatar_url).await?;
    JsonApiResponse::ok(updated.into())
}
