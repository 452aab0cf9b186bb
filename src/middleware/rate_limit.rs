use std::{
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderMap, Request},
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::{config::RateLimitConfig, error::AppError};

const ANONYMOUS_CLIENT: &str = "anonymous";
const CLEANUP_EVERY: usize = 100;

/// Sliding-window request counter keyed by client and route.
#[derive(Clone)]
pub struct RateLimiter {
    attempts: Arc<DashMap<String, Vec<Instant>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Records an attempt for `key`. Returns `false` when the window is already full.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let allowed = {
            let mut attempts = self.attempts.entry(key.to_string()).or_default();
            attempts.retain(|&at| now.duration_since(at) < self.window);

            if attempts.len() < self.max_requests as usize {
                attempts.push(now);
                true
            } else {
                false
            }
        };

        if self.attempts.len() % CLEANUP_EVERY == 0 {
            self.cleanup();
        }
        allowed
    }

    /// Drops keys with no attempts inside the last two windows.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let keep_for = self.window * 2;
        self.attempts.retain(|_, attempts| {
            attempts.retain(|&at| now.duration_since(at) < keep_for);
            !attempts.is_empty()
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Read,
    Write,
}

/// Per-route throttling. A disabled layer passes every request through.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Option<RateLimiter>,
}

impl RateLimitLayer {
    pub fn new(limiter: RateLimiter) -> Self {
        Self {
            limiter: Some(limiter),
        }
    }

    pub fn disabled() -> Self {
        Self { limiter: None }
    }

    pub fn from_config(cfg: &RateLimitConfig, class: RouteClass) -> Self {
        if !cfg.enabled {
            return Self::disabled();
        }
        let limiter = match class {
            RouteClass::Read => RateLimiter::new(cfg.read_requests, cfg.read_window_secs),
            RouteClass::Write => RateLimiter::new(cfg.write_requests, cfg.write_window_secs),
        };
        Self::new(limiter)
    }
}

#[derive(Clone)]
pub struct RateLimit<S> {
    inner: S,
    limiter: Option<RateLimiter>,
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimit<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimit {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

impl<S> Service<Request<Body>> for RateLimit<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        if let Some(limiter) = self.limiter.as_ref() {
            let client = client_id(req.headers());
            let route = req
                .extensions()
                .get::<MatchedPath>()
                .map(|path| path.as_str().to_string())
                .unwrap_or_else(|| req.uri().path().to_string());
            let key = format!("{client}|{} {route}", req.method());

            if !limiter.check(&key) {
                tracing::warn!(client = %client, route = %route, "rate limit exceeded");
                let response =
                    AppError::too_many_requests("Too many requests. Please try again later.")
                        .into_response();
                return Box::pin(async move { Ok(response) });
            }
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}

fn client_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
        })
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(ANONYMOUS_CLIENT)
        .to_string()
}
