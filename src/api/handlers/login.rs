use super::extract_client_ip;
use crate::{api::page, events::EventLog, relay::Relay};
use axum::{
    extract::{Extension, Form},
    http::HeaderMap,
    response::Html,
};
use serde::Deserialize;
use std::{sync::Arc, time::Instant};

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub phone: String,
}

/// `GET /`
pub async fn form() -> Html<String> {
    Html(page::login_page())
}

/// `POST /`: run one authentication attempt and render its outcome.
///
/// The request stays open until the user answers on their phone or the relay times out.
pub async fn submit(
    headers: HeaderMap,
    relay: Extension<Arc<Relay>>,
    events: Extension<Arc<EventLog>>,
    Form(form): Form<LoginForm>,
) -> Html<String> {
    let started = Instant::now();
    let outcome = relay.authenticate(&form.phone).await;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    events.record(
        &form.phone,
        &outcome,
        extract_client_ip(&headers),
        duration_ms,
    );

    Html(page::outcome_page(&form.phone, &outcome))
}
