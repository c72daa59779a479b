//! # Magiclink (Passwordless Phone Authentication Relay)
//!
//! `magiclink` serves a login form, forwards the submitted phone number (MSISDN) to the
//! Mideye Magic Link API and renders the result. The upstream call blocks until the user
//! approves (or rejects) the push notification on their phone, so a single request maps to
//! a single outcome.
//!
//! ## Relay
//!
//! [`relay::Relay`] performs exactly one `GET {base}/api/sfwa/auth?msisdn=...` per attempt
//! and folds every failure (transport, HTTP status, unparseable body) into a
//! [`relay::VerificationOutcome`]. It holds no mutable state and is shared between
//! requests behind an `Arc`.
//!
//! ## Event Log
//!
//! Recent attempts are kept in memory by [`events::EventLog`] (masked phone numbers only)
//! and exposed through bearer-protected JSON endpoints when a dashboard token is configured.

pub mod api;
pub mod cli;
pub mod events;
pub mod relay;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
