use crate::events::{EventLog, Stats};
use axum::{extract::Extension, http::StatusCode, response::Json};
use std::sync::Arc;

#[utoipa::path(
    get,
    path= "/api/stats",
    responses (
        (status = 200, description = "Attempt counters and event log limits", body = Stats),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "dashboard",
)]
pub async fn stats(events: Extension<Arc<EventLog>>) -> Json<Stats> {
    Json(events.stats())
}

#[utoipa::path(
    post,
    path= "/api/stats/reset",
    responses (
        (status = 204, description = "Counters reset; logged events are kept"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "dashboard",
)]
pub async fn reset(events: Extension<Arc<EventLog>>) -> StatusCode {
    events.reset_stats();
    StatusCode::NO_CONTENT
}
