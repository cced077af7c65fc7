//! Rate Limiting Middleware
//!
//! Redis-based sliding window rate limiting for public write endpoints and
//! the admin login. Without Redis, or when Redis fails, requests pass.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use redis::aio::ConnectionManager;
use serde::Serialize;

use crate::config::RateLimitSettings;
use crate::infrastructure::cache::{keys, KEY_PREFIX};
use crate::shared::error::ErrorResponse;
use crate::startup::AppState;

/// Limited endpoint groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitScope {
    /// Submissions, chat openings and messages, donations
    Forms,
    /// Admin login
    Login,
}

impl RateLimitScope {
    fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Forms => "forms",
            RateLimitScope::Login => "login",
        }
    }

    fn limit(&self, settings: &RateLimitSettings) -> u32 {
        match self {
            RateLimitScope::Forms => settings.forms_per_window,
            RateLimitScope::Login => settings.login_per_window,
        }
    }
}

/// Rate limit status returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp when the window resets
    pub reset_at: i64,
    /// Seconds until a retry can succeed
    pub retry_after: u64,
}

#[derive(Debug, Serialize)]
struct RateLimitExceededResponse {
    #[serde(flatten)]
    error: ErrorResponse,
    rate_limit: RateLimitInfo,
}

const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now_ms = tonumber(ARGV[1])
local window_start = tonumber(ARGV[2])
local max_requests = tonumber(ARGV[3])
local window_seconds = tonumber(ARGV[4])

redis.call('ZREMRANGEBYSCORE', key, '-inf', window_start)
local current_count = redis.call('ZCARD', key)

if current_count < max_requests then
    local member = now_ms .. ':' .. math.random(1000000)
    redis.call('ZADD', key, now_ms, member)
    redis.call('EXPIRE', key, window_seconds + 1)
    return {1, current_count + 1}
else
    local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
    local retry_after = 0
    if oldest and #oldest >= 2 then
        retry_after = oldest[2] + (window_seconds * 1000) - now_ms
    end
    return {0, current_count, retry_after}
end
"#;

/// Sliding window limiter over a Redis sorted set.
///
/// Each request adds a member scored by its timestamp; members older than
/// the window are dropped before counting. The Lua script keeps the
/// check-and-add atomic across server instances.
#[derive(Clone)]
pub struct RateLimiter {
    redis: ConnectionManager,
    scope: RateLimitScope,
    max_requests: u32,
    window_seconds: u64,
}

impl RateLimiter {
    pub fn new(redis: ConnectionManager, scope: RateLimitScope, settings: &RateLimitSettings) -> Self {
        Self {
            redis,
            scope,
            max_requests: scope.limit(settings),
            window_seconds: settings.window_seconds.max(1),
        }
    }

    /// `Ok` when the request may proceed, `Err` when it is limited.
    pub async fn check(&self, identifier: &str) -> Result<RateLimitInfo, RateLimitInfo> {
        let key = format!("{}{}", KEY_PREFIX, keys::rate_limit(self.scope.as_str(), identifier));
        let now_ms = chrono::Utc::now().timestamp_millis();
        let window_start = now_ms - (self.window_seconds * 1000) as i64;
        let reset_at = now_ms / 1000 + self.window_seconds as i64;

        let mut conn = self.redis.clone();
        let result: Vec<i64> = match redis::Script::new(SLIDING_WINDOW_SCRIPT)
            .key(&key)
            .arg(now_ms)
            .arg(window_start)
            .arg(self.max_requests as i64)
            .arg(self.window_seconds as i64)
            .invoke_async(&mut conn)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, scope = self.scope.as_str(), "Rate limiter Redis error");
                return Ok(RateLimitInfo {
                    limit: self.max_requests,
                    remaining: self.max_requests,
                    reset_at,
                    retry_after: 0,
                });
            }
        };

        let allowed = result.first().copied() == Some(1);
        let current = result.get(1).copied().unwrap_or(0).max(0) as u32;
        let info = RateLimitInfo {
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(current),
            reset_at,
            retry_after: if allowed {
                0
            } else {
                let retry_ms = result.get(2).copied().unwrap_or(0).max(0);
                (retry_ms as u64).div_ceil(1000)
            },
        };

        if allowed {
            Ok(info)
        } else {
            Err(info)
        }
    }
}

/// Client identifier: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the socket address.
fn extract_identifier(headers: &HeaderMap, client_ip: Option<IpAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .and_then(|ip| ip.parse::<IpAddr>().ok());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
    };

    match forwarded.or_else(real_ip).or(client_ip) {
        Some(ip) => format!("ip:{}", ip),
        None => {
            tracing::warn!("Could not determine client identifier for rate limiting");
            "ip:unknown".to_string()
        }
    }
}

/// Rate limit public form-like writes.
pub async fn rate_limit_forms(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(state, request, next, RateLimitScope::Forms).await
}

/// Rate limit admin login attempts.
pub async fn rate_limit_login(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    rate_limit_inner(state, request, next, RateLimitScope::Login).await
}

async fn rate_limit_inner(
    state: AppState,
    request: Request,
    next: Next,
    scope: RateLimitScope,
) -> Response {
    let Some(redis) = state.redis() else {
        return next.run(request).await;
    };

    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());
    let identifier = extract_identifier(request.headers(), client_ip);
    let limiter = RateLimiter::new(redis, scope, &state.settings.rate_limit);

    match limiter.check(&identifier).await {
        Ok(info) => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(response.headers_mut(), &info);
            response
        }
        Err(info) => {
            tracing::warn!(identifier = %identifier, scope = scope.as_str(), "Rate limit exceeded");
            create_rate_limit_response(info)
        }
    }
}

fn add_rate_limit_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    if let Ok(v) = HeaderValue::from_str(&info.limit.to_string()) {
        headers.insert("X-RateLimit-Limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&info.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&info.reset_at.to_string()) {
        headers.insert("X-RateLimit-Reset", v);
    }
}

fn create_rate_limit_response(info: RateLimitInfo) -> Response {
    let info = RateLimitInfo { remaining: 0, ..info };
    let body = RateLimitExceededResponse {
        error: ErrorResponse::new("Too many requests, please slow down"),
        rate_limit: info.clone(),
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    if let Ok(v) = HeaderValue::from_str(&info.retry_after.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, v);
    }
    add_rate_limit_headers(response.headers_mut(), &info);
    response
}
