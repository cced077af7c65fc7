//! Instagram Feed Handler

use axum::{
    extract::{Query, State},
    Json,
};

use crate::application::dto::request::InstagramQuery;
use crate::application::dto::response::ApiResponse;
use crate::application::services::InstagramService;
use crate::infrastructure::instagram::InstagramPost;
use crate::startup::AppState;

const DEFAULT_LIMIT: u32 = 12;

/// Recent posts; an unavailable feed is empty with a warning, never an error
pub async fn feed(
    State(state): State<AppState>,
    Query(query): Query<InstagramQuery>,
) -> Json<ApiResponse<Vec<InstagramPost>>> {
    let feed = state
        .instagram_service()
        .feed(query.limit.unwrap_or(DEFAULT_LIMIT))
        .await;
    Json(ApiResponse::with_warning(feed.posts, feed.warning))
}
