//! Health Check Handlers
//!
//! Liveness and readiness probes.
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe (is the process up?)
//! - `GET /health/ready` - Readiness probe (can it serve traffic?)

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::startup::AppState;

static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Pin the start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ServiceHealth,
    pub redis: ServiceHealth,
    pub chat_relay: ChatRelayHealth,
    pub notifications: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatRelayHealth {
    pub status: HealthStatus,
    pub open_rooms: usize,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    /// Optional dependency that is not configured
    Disabled,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness probe, always 200 while the process runs
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Readiness probe, 503 when the database is unreachable
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let database = check_database(&state).await;
    let redis = check_redis(&state).await;

    let chat_relay = match &state.rooms {
        Some(rooms) => ChatRelayHealth {
            status: HealthStatus::Healthy,
            open_rooms: rooms.room_count(),
        },
        None => ChatRelayHealth {
            status: HealthStatus::Disabled,
            open_rooms: 0,
        },
    };

    let status = determine_overall_status(&database, &redis);
    let response = ReadinessResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        checks: HealthChecks {
            database,
            redis,
            chat_relay,
            notifications: if state.notifier.is_enabled() {
                "enabled"
            } else {
                "disabled"
            },
        },
    };

    let status_code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (status_code, Json(response))
}

async fn check_database(state: &AppState) -> ServiceHealth {
    let start = Instant::now();
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => {
            let latency = start.elapsed().as_millis() as u64;
            ServiceHealth {
                status: if latency < 100 {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                },
                latency_ms: Some(latency),
                message: None,
            }
        }
        Err(e) => ServiceHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some(format!("Database connection failed: {}", e)),
        },
    }
}

async fn check_redis(state: &AppState) -> ServiceHealth {
    let Some(mut conn) = state.redis() else {
        return ServiceHealth {
            status: HealthStatus::Disabled,
            latency_ms: None,
            message: None,
        };
    };

    let start = Instant::now();
    match redis::cmd("PING").query_async::<String>(&mut conn).await {
        Ok(_) => ServiceHealth {
            status: HealthStatus::Healthy,
            latency_ms: Some(start.elapsed().as_millis() as u64),
            message: None,
        },
        Err(e) => ServiceHealth {
            status: HealthStatus::Degraded,
            latency_ms: None,
            message: Some(format!("Redis connection failed: {}", e)),
        },
    }
}

/// Only the database is critical; Redis problems degrade.
fn determine_overall_status(db: &ServiceHealth, redis: &ServiceHealth) -> HealthStatus {
    if db.status == HealthStatus::Unhealthy {
        return HealthStatus::Unhealthy;
    }
    if db.status == HealthStatus::Degraded
        || matches!(redis.status, HealthStatus::Degraded | HealthStatus::Unhealthy)
    {
        return HealthStatus::Degraded;
    }
    HealthStatus::Healthy
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn health(status: HealthStatus) -> ServiceHealth {
        ServiceHealth {
            status,
            latency_ms: None,
            message: None,
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&HealthStatus::Disabled).unwrap(), "\"disabled\"");
    }

    #[test_case(HealthStatus::Healthy, HealthStatus::Healthy, HealthStatus::Healthy)]
    #[test_case(HealthStatus::Healthy, HealthStatus::Disabled, HealthStatus::Healthy)]
    #[test_case(HealthStatus::Healthy, HealthStatus::Degraded, HealthStatus::Degraded)]
    #[test_case(HealthStatus::Degraded, HealthStatus::Healthy, HealthStatus::Degraded)]
    #[test_case(HealthStatus::Unhealthy, HealthStatus::Healthy, HealthStatus::Unhealthy)]
    fn overall_status(db: HealthStatus, redis: HealthStatus, expected: HealthStatus) {
        assert_eq!(determine_overall_status(&health(db), &health(redis)), expected);
    }
}
