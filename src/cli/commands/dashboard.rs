use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("event-log-max-size")
                .long("event-log-max-size")
                .help("Maximum number of events kept in the in-memory event log (100-50000)")
                .env("MAGICLINK_EVENT_LOG_MAX_SIZE")
                .default_value("1000")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("event-ttl-hours")
                .long("event-ttl-hours")
                .help("Hours an event is kept in the event log")
                .env("MAGICLINK_EVENT_TTL_HOURS")
                .default_value("1")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("dashboard-token")
                .long("dashboard-token")
                .help("Bearer token for the /api endpoints, the endpoints are disabled when unset")
                .env("MAGICLINK_DASHBOARD_TOKEN")
                .hide_env_values(true),
        )
}
