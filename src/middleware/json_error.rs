use axum::{
    body::{Bytes, to_bytes},
    extract::Request,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    response::{JsonApiResponse, log_app_error},
};

const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;

/// Rewrites plain-text error bodies (router fallbacks, extractor rejections) into the JSON envelope.
pub async fn json_error_middleware(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();

    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }
    if is_json_response(response.headers()) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let message = match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => body_bytes_to_message(status, bytes),
        Err(_) => default_message(status),
    };

    let envelope = match app_error_from_status(status, message) {
        Ok(app_error) => {
            if status.is_server_error() {
                log_app_error(&app_error, status);
            }
            JsonApiResponse::from_error(&app_error)
        }
        Err(message) => JsonApiResponse {
            status: status.as_u16(),
            message,
            data: serde_json::Value::Null,
        },
    };

    let mut new_response = envelope.into_response();
    copy_headers(&parts.headers, &mut new_response);
    new_response
}

fn is_json_response(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("application/json") || value.contains("+json")
        })
        .unwrap_or(false)
}

fn body_bytes_to_message(status: StatusCode, bytes: Bytes) -> String {
    let message = String::from_utf8_lossy(&bytes).trim().to_string();
    if message.is_empty() {
        return default_message(status);
    }
    message
}

fn default_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

/// Statuses without an `AppError` counterpart keep their code and come back as `Err(message)`.
fn app_error_from_status(status: StatusCode, message: String) -> Result<AppError, String> {
    match status {
        StatusCode::BAD_REQUEST => Ok(AppError::bad_request(message)),
        StatusCode::UNAUTHORIZED => Ok(AppError::unauthorized(message)),
        StatusCode::NOT_FOUND => Ok(AppError::not_found(message)),
        StatusCode::CONFLICT => Ok(AppError::conflict(message)),
        StatusCode::UNPROCESSABLE_ENTITY => Ok(AppError::validation(message)),
        StatusCode::TOO_MANY_REQUESTS => Ok(AppError::too_many_requests(message)),
        _ if status.is_server_error() => Ok(AppError::internal(message)),
        _ => Err(message),
    }
}

fn copy_headers(src: &HeaderMap, dest: &mut Response) {
    for (name, value) in src {
        if name == header::CONTENT_TYPE || name == header::CONTENT_LENGTH {
            continue;
        }
        dest.headers_mut().insert(name.clone(), value.clone());
    }
}
