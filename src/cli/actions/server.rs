use crate::{api, cli::globals::GlobalArgs, cli::telemetry};
use anyhow::Result;
use secrecy::SecretString;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub mideye_url: String,
    pub mideye_api_key: SecretString,
    pub timeout_seconds: u64,
    pub skip_tls_verify: bool,
    pub event_log_max_size: usize,
    pub event_ttl_hours: u64,
    pub dashboard_token: Option<SecretString>,
}

impl Args {
    /// Read-only configuration handed to the relay and the router.
    #[must_use]
    pub fn globals(&self) -> GlobalArgs {
        let mut globals = GlobalArgs::new(self.mideye_url.clone());
        globals.set_api_key(self.mideye_api_key.clone());
        globals.timeout_seconds = self.timeout_seconds;
        globals.skip_tls_verify = self.skip_tls_verify;
        globals.event_log_max_size = self.event_log_max_size;
        globals.event_ttl_hours = self.event_ttl_hours;
        if let Some(token) = &self.dashboard_token {
            globals.set_dashboard_token(token.clone());
        }
        globals
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the relay cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let globals = args.globals();
    let result = api::new(args.port, &globals).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let entries = startup_entries(args);
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\nStartup configuration:", banner());
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn startup_entries(args: &Args) -> Vec<(&'static str, String)> {
    vec![
        ("listen", format!("tcp:{}", args.port)),
        ("mideye_url", args.mideye_url.clone()),
        ("api_endpoint", format!("{}{}", args.mideye_url, crate::relay::AUTH_PATH)),
        ("mideye_api_key", "set".to_string()),
        ("timeout_seconds", args.timeout_seconds.to_string()),
        ("skip_tls_verify", args.skip_tls_verify.to_string()),
        ("event_log_max_size", args.event_log_max_size.to_string()),
        ("event_ttl_hours", args.event_ttl_hours.to_string()),
        (
            "dashboard",
            if args.dashboard_token.is_some() {
                "enabled".to_string()
            } else {
                "disabled".to_string()
            },
        ),
    ]
}

fn banner() -> String {
    let short_hash = short_commit(crate::GIT_COMMIT_HASH);
    BANNER.replace(
        "{VERSION}",
        &format!(" - {} - {}", env!("CARGO_PKG_VERSION"), short_hash),
    )
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}

const BANNER: &str = r"
   .-----.
   | === |
   |     |   M A G I C L I N K {VERSION}
   |  o  |
   '-----'";
