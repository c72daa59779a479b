use crate::events::{EventEntry, EventLog};
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

pub const DEFAULT_EVENTS_LIMIT: usize = 50;
pub const MAX_EVENTS_LIMIT: usize = 1000;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Number of entries to return (default 50, max 1000).
    pub limit: Option<usize>,
}

impl EventsQuery {
    fn effective_limit(&self) -> usize {
        match self.limit {
            Some(limit) if limit > 0 => limit.min(MAX_EVENTS_LIMIT),
            _ => DEFAULT_EVENTS_LIMIT,
        }
    }
}

#[utoipa::path(
    get,
    path= "/api/events",
    params(EventsQuery),
    responses (
        (status = 200, description = "Recent authentication attempts, newest first", body = [EventEntry]),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "dashboard",
)]
pub async fn events(
    events: Extension<Arc<EventLog>>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<EventEntry>> {
    Json(events.recent(query.effective_limit()))
}

#[utoipa::path(
    delete,
    path= "/api/events",
    responses (
        (status = 204, description = "Event log emptied; counters are kept"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "dashboard",
)]
pub async fn clear(events: Extension<Arc<EventLog>>) -> StatusCode {
    events.clear();
    StatusCode::NO_CONTENT
}
