mod extract;
mod msisdn;
mod outcome;

pub use self::extract::{ExtractError, extract_code};
pub use self::msisdn::{encode_msisdn, mask_msisdn};
pub use self::outcome::{OutcomeKind, TOUCH_ACCEPTED, VerificationOutcome};

use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result, anyhow};
use reqwest::{Client, header::ACCEPT};
use secrecy::{ExposeSecret, SecretString};
use std::{error::Error as StdError, fmt::Write, time::Duration, time::Instant};
use tracing::{Instrument, debug, error, info, info_span, warn};
use url::Url;

pub const AUTH_PATH: &str = "/api/sfwa/auth";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Mideye Magic Link API.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct Relay {
    client: Client,
    base_url: String,
    api_key: SecretString,
    timeout: Duration,
    skip_tls_verify: bool,
}

impl Relay {
    /// Build a relay from the startup configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is not an absolute http(s) URL or the HTTP client
    /// cannot be built.
    pub fn new(globals: &GlobalArgs) -> Result<Self> {
        let base_url = validate_base_url(&globals.mideye_url)?;
        let timeout = Duration::from_secs(globals.timeout_seconds.max(1));

        Self::with_timeout(
            base_url,
            globals.mideye_api_key.clone(),
            timeout,
            globals.skip_tls_verify,
        )
    }

    /// Build a relay with an explicit timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(
        base_url: String,
        api_key: SecretString,
        timeout: Duration,
        skip_tls_verify: bool,
    ) -> Result<Self> {
        if skip_tls_verify {
            warn!("TLS certificate verification for the Mideye API is DISABLED (testing only)");
        }

        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .danger_accept_invalid_certs(skip_tls_verify)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
            skip_tls_verify,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn skip_tls_verify(&self) -> bool {
        self.skip_tls_verify
    }

    /// Full upstream URL for `phone`, with the number encoded as the `msisdn` parameter.
    ///
    /// # Errors
    /// Returns an error if the base URL cannot be parsed.
    pub fn auth_url(&self, phone: &str) -> Result<Url> {
        let url = format!(
            "{}{AUTH_PATH}?msisdn={}",
            self.base_url,
            encode_msisdn(phone)
        );
        Url::parse(&url).with_context(|| format!("invalid Mideye URL: {}", self.base_url))
    }

    /// Ask the Magic Link API to authenticate `phone` and wait for the answer.
    ///
    /// Issues exactly one request and never retries. Every failure is returned as an outcome.
    pub async fn authenticate(&self, phone: &str) -> VerificationOutcome {
        let masked = mask_msisdn(phone);
        let started = Instant::now();

        info!("Initiating authentication (phone: {masked})");

        let outcome = self.call(phone).await;
        let duration_ms = started.elapsed().as_millis();

        match &outcome {
            VerificationOutcome::Accepted => {
                info!("Authentication ACCEPTED (phone: {masked}, {duration_ms} ms)");
            }
            VerificationOutcome::Rejected { code } => {
                warn!("Authentication REJECTED (phone: {masked}, code: {code}, {duration_ms} ms)");
            }
            VerificationOutcome::TransportError { message, .. }
            | VerificationOutcome::ParseError { message } => {
                error!(
                    "Error calling Magic Link API (phone: {masked}, {duration_ms} ms): {message}"
                );
            }
        }

        outcome
    }

    async fn call(&self, phone: &str) -> VerificationOutcome {
        let url = match self.auth_url(phone) {
            Ok(url) => url,
            Err(err) => {
                return VerificationOutcome::TransportError {
                    message: format!("{err:#}"),
                    timed_out: false,
                };
            }
        };

        debug!("Calling Magic Link API: GET {}{AUTH_PATH}?msisdn=***", self.base_url);

        let span = info_span!(
            "mideye.auth",
            http.method = "GET",
            url = %format!("{}{AUTH_PATH}", self.base_url)
        );

        let response = match self
            .client
            .get(url)
            .header("api-key", self.api_key.expose_secret())
            .header(ACCEPT, "application/json")
            .send()
            .instrument(span)
            .await
        {
            Ok(response) => response,
            Err(err) => return transport_error(err),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return transport_error(err),
        };

        debug!("Magic Link API response status={} body={}", status, body);

        if !status.is_success() {
            return VerificationOutcome::TransportError {
                message: format!("Mideye API returned HTTP {status}: {}", body.trim()),
                timed_out: false,
            };
        }

        match extract_code(&body) {
            Ok(code) => VerificationOutcome::from_code(code),
            Err(err) => VerificationOutcome::ParseError {
                message: err.to_string(),
            },
        }
    }
}

/// Check that `url` is an absolute http(s) URL and strip trailing slashes.
///
/// # Errors
/// Returns an error if the URL is blank, unparseable, has no host or uses another scheme.
pub fn validate_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Mideye URL is not configured"));
    }

    let parsed = Url::parse(trimmed).with_context(|| format!("invalid Mideye URL: {trimmed}"))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(anyhow!("Error parsing URL: unsupported scheme {scheme}")),
    }

    if parsed.host().is_none() {
        return Err(anyhow!("Error parsing URL: no host specified"));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

// The request URL carries the phone number in clear, keep it out of the message.
fn transport_error(err: reqwest::Error) -> VerificationOutcome {
    let timed_out = err.is_timeout();
    let err = err.without_url();

    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(message, ": {cause}");
        source = cause.source();
    }

    VerificationOutcome::TransportError { message, timed_out }
}
