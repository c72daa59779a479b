use crate::events::{EventEntry, EventLog};
use axum::{
    extract::{Extension, Query},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};
use chrono::SecondsFormat;
use serde::Deserialize;
use std::{fmt::Write, sync::Arc};
use utoipa::IntoParams;

pub const MAX_EXPORT_LIMIT: usize = 5000;

const CSV_HEADER: &str =
    "Timestamp,Phone Number,Outcome,Response Code,IP Address,Duration (ms),Error\n";

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Number of entries to export (default and max 5000).
    pub limit: Option<usize>,
}

impl ExportQuery {
    fn effective_limit(&self) -> usize {
        match self.limit {
            Some(limit) if limit > 0 => limit.min(MAX_EXPORT_LIMIT),
            _ => MAX_EXPORT_LIMIT,
        }
    }
}

#[utoipa::path(
    get,
    path= "/api/export/events",
    params(ExportQuery),
    responses (
        (status = 200, description = "Recent authentication attempts as CSV, newest first", body = String, content_type = "text/csv"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "dashboard",
)]
pub async fn export_events(
    events: Extension<Arc<EventLog>>,
    Query(query): Query<ExportQuery>,
) -> impl IntoResponse {
    let csv = events_csv(&events.recent(query.effective_limit()));

    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"magic-link-events.csv\"",
            ),
        ],
        csv,
    )
}

pub(crate) fn events_csv(entries: &[EventEntry]) -> String {
    let mut csv = String::from(CSV_HEADER);
    for entry in entries {
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{},{}",
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            escape_csv(&entry.phone_number),
            entry.outcome,
            escape_csv(entry.response_code.as_deref().unwrap_or_default()),
            escape_csv(entry.ip_address.as_deref().unwrap_or_default()),
            entry.duration_ms,
            escape_csv(entry.error_message.as_deref().unwrap_or_default()),
        );
    }
    csv
}

// Quote fields holding a separator, quote or line break; double inner quotes.
fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
