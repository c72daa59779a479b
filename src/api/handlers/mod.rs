pub mod config;
pub mod dashboard;
pub mod events;
pub mod export;
pub mod health;
pub mod login;
pub mod stats;

use axum::http::HeaderMap;

/// Client address as reported by the reverse proxy, first `x-forwarded-for` hop wins.
pub(crate) fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
