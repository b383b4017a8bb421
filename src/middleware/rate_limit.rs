use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

/// Fixed one-second window limiter, one instance per router group. The AI
/// generation endpoints get a much lower budget than plain reads.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    scope: &'static str,
    rps: u32,
    window: Arc<Mutex<WindowState>>,
}

impl RateLimiter {
    fn new(scope: &'static str, rps: u32) -> Self {
        Self {
            scope,
            rps: rps.max(1),
            window: Arc::new(Mutex::new(WindowState {
                start: Instant::now(),
                count: 0,
            })),
        }
    }

    fn allow(&self) -> bool {
        let mut guard = self.window.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();
        if now.duration_since(guard.start) >= Duration::from_secs(1) {
            guard.start = now;
            guard.count = 0;
        }
        if guard.count < self.rps {
            guard.count += 1;
            true
        } else {
            false
        }
    }
}

pub async fn rps_middleware(
    State(state): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.allow() {
        tracing::warn!(scope = state.scope, rps = state.rps, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": {"code": "RATE_LIMITED", "message": "Too many requests"}})),
        )
            .into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(scope: &'static str, rps: u32) -> RateLimiter {
    RateLimiter::new(scope, rps)
}
