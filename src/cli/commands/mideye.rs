use clap::{Arg, ArgAction, Command, builder::BoolishValueParser};

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("mideye-url")
                .long("mideye-url")
                .help("Base URL of the Mideye Server, example: https://mideye.domain.local:8443")
                .env("MIDEYE_URL")
                .required(true),
        )
        .arg(
            Arg::new("mideye-api-key")
                .long("mideye-api-key")
                .help("API key for the Magic Link endpoint")
                .env("MIDEYE_API_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Seconds to wait for the Magic Link API (the user must answer within this time)")
                .env("MIDEYE_TIMEOUT_SECONDS")
                .default_value("120")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("skip-tls-verify")
                .long("skip-tls-verify")
                .help("Skip TLS certificate verification of the Mideye Server (testing only)")
                .env("MIDEYE_SKIP_TLS_VERIFY")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
}
