use crate::{
    api::handlers::{config, dashboard, events, export, health, login, stats},
    cli::globals::GlobalArgs,
    events::EventLog,
    relay::Relay,
};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, options},
};
use secrecy::SecretString;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa::openapi::{
    Components, Contact, InfoBuilder, License, OpenApiBuilder, Tag,
    security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_axum::{router::OpenApiRouter, routes};

mod auth;
pub mod handlers;
pub mod page;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = router().split_for_parts();
    openapi
}

/// Build the API router with all documented routes registered.
///
/// The HTML form routes are added by [`app`] and are not part of the `OpenAPI` document.
#[must_use]
pub fn router() -> OpenApiRouter {
    let mut router = api_router().merge(dashboard_router());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Liveness and build information".to_string());
    let mut dashboard_tag = Tag::new("dashboard");
    dashboard_tag.description =
        Some("Recent authentication attempts and counters (bearer token)".to_string());
    router.get_openapi_mut().tags = Some(vec![health_tag, dashboard_tag]);

    router
}

fn api_router() -> OpenApiRouter {
    OpenApiRouter::with_openapi(cargo_openapi()).routes(routes!(health::health))
}

fn dashboard_router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(events::events, events::clear))
        .routes(routes!(export::export_events))
        .routes(routes!(stats::stats))
        .routes(routes!(stats::reset))
        .routes(routes!(config::config))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    let mut components = Components::new();
    components.add_security_scheme(
        "bearer",
        SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
    );

    OpenApiBuilder::new()
        .info(info)
        .components(Some(components))
        .build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}

/// Assemble the full application: login form, health probe and, when a token is
/// given, the dashboard page and the bearer-protected dashboard endpoints.
pub fn app(
    relay: Arc<Relay>,
    events: Arc<EventLog>,
    dashboard_token: Option<SecretString>,
) -> Router {
    let (mut router, _openapi) = api_router().split_for_parts();

    if let Some(token) = dashboard_token {
        let (protected, _openapi) = dashboard_router().split_for_parts();
        router = router.merge(protected.layer(middleware::from_fn_with_state(
            Arc::new(token),
            auth::require_bearer,
        )));
        router = router.route("/dashboard", get(dashboard::dashboard));
    }

    router
        .route("/", get(login::form).post(login::submit))
        .route("/health", options(health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(relay))
                .layer(Extension(events)),
        )
}

/// Start the HTTP server and block until it is shut down.
/// # Errors
/// Returns an error if the relay cannot be built, the port cannot be bound or the server fails.
pub async fn new(port: u16, globals: &GlobalArgs) -> Result<()> {
    let relay = Arc::new(Relay::new(globals).context("Failed to configure Mideye relay")?);
    let events = Arc::new(EventLog::new(
        globals.event_log_max_size,
        globals.event_ttl_hours,
    ));

    let app = app(relay, events, globals.dashboard_token.clone());

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

// Headers stay out of the span, the dashboard routes carry a bearer token.
fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
