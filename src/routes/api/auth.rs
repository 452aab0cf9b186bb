use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    middleware::{BearerToken, ValidatedJson},
    response::{ApiResult, JsonApiResponse},
    routes::api::users::UserResponse,
    services::{ConfirmOutcome, ServiceContext, SignupRequest, TokenPair},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct SignupBody {
    #[validate(length(min = 3, max = 20))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 5, max = 20))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginBody {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailBody {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordBody {
    #[validate(length(min = 5, max = 20))]
    pub password: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh_token", get(refresh_token))
        .route("/auth/confirmed_email/{token}", get(confirmed_email))
        .route("/auth/request_email", post(request_email))
        .route("/auth/reset_password", post(reset_password))
        .route("/auth/reset/{token}", post(reset))
        .with_state(state)
}

async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<SignupBody>,
) -> ApiResult<UserResponse> {
    let services = ServiceContext::from_state(state.as_ref());
    let user = services
        .auth(&state)
        .signup(SignupRequest {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;
    JsonApiResponse::with_status(
        StatusCode::CREATED,
        "User successfully created. Check your email for confirmation.",
        user.into(),
    )
}

async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<LoginBody>,
) -> ApiResult<TokenPair> {
    let services = ServiceContext::from_state(state.as_ref());
    let tokens = services.auth(&state).login(&body.email, &body.password).await?;
    JsonApiResponse::ok(tokens)
}

async fn refresh_token(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> ApiResult<TokenPair> {
    let services = ServiceContext::from_state(state.as_ref());
    let tokens = services.auth(&state).refresh(&token).await?;
    JsonApiResponse::ok(tokens)
}

async fn confirmed_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> ApiResult<()> {
    let services = ServiceContext::from_state(state.as_ref());
    let message = match services.auth(&state).confirm_email(&token).await? {
        ConfirmOutcome::Confirmed => "Email confirmed",
        ConfirmOutcome::AlreadyConfirmed => "Your email is already confirmed!",
    };
    JsonApiResponse::with_message(message, ())
}

async fn request_email(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<EmailBody>,
) -> ApiResult<()> {
    let services = ServiceContext::from_state(state.as_ref());
    let message = match services.auth(&state).request_email(&body.email).await? {
        Some(ConfirmOutcome::AlreadyConfirmed) => "Your email is already confirmed",
        _ => "Check your email for confirmation.",
    };
    JsonApiResponse::with_message(message, ())
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<EmailBody>,
) -> ApiResult<()> {
    let services = ServiceContext::from_state(state.as_ref());
    services
        .auth(&state)
        .request_password_reset(&body.email)
        .await?;
    JsonApiResponse::with_message("Check your email to reset password.", ())
}

async fn reset(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    ValidatedJson(body): ValidatedJson<PasswordBody>,
) -> ApiResult<()> {
    let services = ServiceContext::from_state(state.as_ref());
    services
        .auth(&state)
        .reset_password(&token, &body.password)
        .await?;
    JsonApiResponse::with_message("Password updated", ())
}
