use crate::{
    events::EventLog,
    relay::{AUTH_PATH, Relay},
};
use axum::{extract::Extension, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Effective runtime configuration. Secrets are never included.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub mideye_url: String,
    pub api_endpoint: String,
    pub configured: bool,
    pub timeout_seconds: u64,
    pub skip_tls_verify: bool,
    pub event_log_max_size: usize,
    pub event_ttl_hours: u64,
}

impl ConfigView {
    #[must_use]
    pub fn new(relay: &Relay, events: &EventLog) -> Self {
        Self {
            mideye_url: relay.base_url().to_string(),
            api_endpoint: format!("{}{AUTH_PATH}", relay.base_url()),
            configured: !relay.base_url().is_empty(),
            timeout_seconds: relay.timeout().as_secs(),
            skip_tls_verify: relay.skip_tls_verify(),
            event_log_max_size: events.max_size(),
            event_ttl_hours: events.ttl_hours(),
        }
    }
}

#[utoipa::path(
    get,
    path= "/api/config",
    responses (
        (status = 200, description = "Non-secret runtime configuration", body = ConfigView),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "dashboard",
)]
pub async fn config(
    relay: Extension<Arc<Relay>>,
    events: Extension<Arc<EventLog>>,
) -> Json<ConfigView> {
    Json(ConfigView::new(&relay, &events))
}
