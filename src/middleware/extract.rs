use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON body that has passed its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string that has passed its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection)?;
        value.validate()?;
        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection.status() {
        StatusCode::UNPROCESSABLE_ENTITY => AppError::validation(rejection.body_text()),
        _ => AppError::bad_request(rejection.body_text()),
    }
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    AppError::validation(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        routing::{get, post},
    };
    use serde::Deserialize;
    use tower::ServiceExt;
    use validator::Validate;

    use super::{ValidatedJson, ValidatedQuery};

    #[derive(Deserialize, Validate)]
    struct SignupBody {
        #[validate(length(min = 3, max = 20))]
        username: String,
    }

    #[derive(Deserialize, Validate)]
    struct Search {
        #[validate(length(min = 1))]
        contact_name: String,
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/signup",
                post(|ValidatedJson(body): ValidatedJson<SignupBody>| async move { body.username }),
            )
            .route(
                "/search",
                get(|ValidatedQuery(q): ValidatedQuery<Search>| async move { q.contact_name }),
            )
    }

    async fn status_and_body(req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(req).await.expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 16 * 1024)
            .await
            .expect("body should read");
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    fn json_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build")
    }

    #[tokio::test]
    async fn rule_violation_is_unprocessable() {
        let (status, body) = status_and_body(json_post(r#"{"username":"ab"}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], 422);
    }

    #[tokio::test]
    async fn missing_field_is_unprocessable() {
        let (status, _) = status_and_body(json_post("{}")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) = status_and_body(json_post("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn valid_body_reaches_handler() {
        let response = app()
            .oneshot(json_post(r#"{"username":"alice"}"#))
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_query_param_is_unprocessable() {
        let (status, _) = status_and_body(
            Request::builder()
                .uri("/search")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
