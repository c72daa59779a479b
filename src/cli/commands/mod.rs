mod dashboard;
mod logging;
mod mideye;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

/// Reject blank credentials that clap accepts as present.
///
/// # Errors
/// Returns an error string if the API key or the dashboard token is blank.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    if matches
        .get_one::<String>("mideye-api-key")
        .is_some_and(|key| key.trim().is_empty())
    {
        return Err("Invalid argument: --mideye-api-key must not be blank".to_string());
    }

    if matches
        .get_one::<String>("dashboard-token")
        .is_some_and(|token| token.trim().is_empty())
    {
        return Err("Invalid argument: --dashboard-token must not be blank".to_string());
    }

    Ok(())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("magiclink")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("MAGICLINK_PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    let command = mideye::with_args(command);
    let command = dashboard::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://mideye.domain.local:8443";

    fn env_cleared<F: FnOnce()>(f: F) {
        temp_env::with_vars(
            [
                ("MIDEYE_URL", None::<&str>),
                ("MIDEYE_API_KEY", None),
                ("MIDEYE_TIMEOUT_SECONDS", None),
                ("MIDEYE_SKIP_TLS_VERIFY", None),
                ("MAGICLINK_PORT", None),
                ("MAGICLINK_EVENT_LOG_MAX_SIZE", None),
                ("MAGICLINK_EVENT_TTL_HOURS", None),
                ("MAGICLINK_DASHBOARD_TOKEN", None),
                ("MAGICLINK_LOG_LEVEL", None),
            ],
            f,
        );
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "magiclink");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some(env!("CARGO_PKG_DESCRIPTION").to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_args() {
        env_cleared(|| {
            let command = new();
            let matches = command.get_matches_from(vec![
                "magiclink",
                "--port",
                "9090",
                "--mideye-url",
                URL,
                "--mideye-api-key",
                "api-key",
                "--timeout",
                "30",
                "--skip-tls-verify",
                "--event-log-max-size",
                "200",
                "--event-ttl-hours",
                "4",
                "--dashboard-token",
                "dash",
            ]);

            assert_eq!(matches.get_one::<u16>("port").copied(), Some(9090));
            assert_eq!(
                matches.get_one::<String>("mideye-url").cloned(),
                Some(URL.to_string())
            );
            assert_eq!(
                matches.get_one::<String>("mideye-api-key").cloned(),
                Some("api-key".to_string())
            );
            assert_eq!(matches.get_one::<u64>("timeout").copied(), Some(30));
            assert!(matches.get_flag("skip-tls-verify"));
            assert_eq!(
                matches.get_one::<usize>("event-log-max-size").copied(),
                Some(200)
            );
            assert_eq!(matches.get_one::<u64>("event-ttl-hours").copied(), Some(4));
            assert_eq!(
                matches.get_one::<String>("dashboard-token").cloned(),
                Some("dash".to_string())
            );
        });
    }

    #[test]
    fn test_defaults() {
        env_cleared(|| {
            let command = new();
            let matches = command.get_matches_from(vec![
                "magiclink",
                "--mideye-url",
                URL,
                "--mideye-api-key",
                "api-key",
            ]);

            assert_eq!(matches.get_one::<u16>("port").copied(), Some(8080));
            assert_eq!(matches.get_one::<u64>("timeout").copied(), Some(120));
            assert!(!matches.get_flag("skip-tls-verify"));
            assert_eq!(
                matches.get_one::<usize>("event-log-max-size").copied(),
                Some(1000)
            );
            assert_eq!(matches.get_one::<u64>("event-ttl-hours").copied(), Some(1));
            assert_eq!(matches.get_one::<String>("dashboard-token"), None);
            assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(0));
        });
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("MIDEYE_URL", Some(URL)),
                ("MIDEYE_API_KEY", Some("env-key")),
                ("MIDEYE_TIMEOUT_SECONDS", Some("45")),
                ("MIDEYE_SKIP_TLS_VERIFY", Some("true")),
                ("MAGICLINK_PORT", Some("443")),
                ("MAGICLINK_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["magiclink"]);
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(443));
                assert_eq!(
                    matches.get_one::<String>("mideye-url").cloned(),
                    Some(URL.to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("mideye-api-key").cloned(),
                    Some("env-key".to_string())
                );
                assert_eq!(matches.get_one::<u64>("timeout").copied(), Some(45));
                assert!(matches.get_flag("skip-tls-verify"));
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_missing_api_key() {
        env_cleared(|| {
            let result = new().try_get_matches_from(vec!["magiclink", "--mideye-url", URL]);
            assert_eq!(
                result.map_err(|e| e.kind()).err(),
                Some(clap::error::ErrorKind::MissingRequiredArgument)
            );
        });
    }

    #[test]
    fn test_timeout_must_be_positive() {
        env_cleared(|| {
            let result = new().try_get_matches_from(vec![
                "magiclink",
                "--mideye-url",
                URL,
                "--mideye-api-key",
                "key",
                "--timeout",
                "0",
            ]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("MAGICLINK_LOG_LEVEL", Some(level)),
                    ("MIDEYE_URL", Some(URL)),
                    ("MIDEYE_API_KEY", Some("key")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["magiclink"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").copied(),
                        u8::try_from(index).ok()
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            env_cleared(|| {
                let mut args = vec![
                    "magiclink".to_string(),
                    "--mideye-url".to_string(),
                    URL.to_string(),
                    "--mideye-api-key".to_string(),
                    "key".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_validate_blank_secrets() {
        env_cleared(|| {
            let matches = new().get_matches_from(vec![
                "magiclink",
                "--mideye-url",
                URL,
                "--mideye-api-key",
                "   ",
            ]);
            assert!(validate(&matches).is_err());

            let matches = new().get_matches_from(vec![
                "magiclink",
                "--mideye-url",
                URL,
                "--mideye-api-key",
                "key",
                "--dashboard-token",
                "",
            ]);
            assert!(validate(&matches).is_err());

            let matches = new().get_matches_from(vec![
                "magiclink",
                "--mideye-url",
                URL,
                "--mideye-api-key",
                "key",
            ]);
            assert!(validate(&matches).is_ok());
        });
    }
}
