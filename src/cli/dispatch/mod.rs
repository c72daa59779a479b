use crate::cli::actions::{Action, server::Args};
use crate::relay::validate_base_url;
use anyhow::{Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    crate::cli::commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;

    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let mideye_url = matches
        .get_one::<String>("mideye-url")
        .context("missing required argument: --mideye-url")?;
    let mideye_url = validate_base_url(mideye_url).context("invalid MIDEYE_URL")?;

    let mideye_api_key = matches
        .get_one::<String>("mideye-api-key")
        .map(|key| SecretString::from(key.trim().to_string()))
        .context("missing required argument: --mideye-api-key")?;

    let timeout_seconds = matches
        .get_one::<u64>("timeout")
        .copied()
        .unwrap_or(crate::cli::globals::DEFAULT_TIMEOUT_SECONDS);
    let skip_tls_verify = matches.get_flag("skip-tls-verify");

    let event_log_max_size = matches
        .get_one::<usize>("event-log-max-size")
        .copied()
        .unwrap_or(crate::cli::globals::DEFAULT_EVENT_LOG_MAX_SIZE);
    let event_ttl_hours = matches
        .get_one::<u64>("event-ttl-hours")
        .copied()
        .unwrap_or(crate::cli::globals::DEFAULT_EVENT_TTL_HOURS);
    let dashboard_token = matches
        .get_one::<String>("dashboard-token")
        .map(|token| SecretString::from(token.trim().to_string()));

    Ok(Action::Server(Args {
        port,
        mideye_url,
        mideye_api_key,
        timeout_seconds,
        skip_tls_verify,
        event_log_max_size,
        event_ttl_hours,
        dashboard_token,
    }))
}
