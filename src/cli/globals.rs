use secrecy::SecretString;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
pub const DEFAULT_EVENT_LOG_MAX_SIZE: usize = 1000;
pub const DEFAULT_EVENT_TTL_HOURS: u64 = 1;

/// Process-wide, read-only configuration established at startup.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub mideye_url: String,
    pub mideye_api_key: SecretString,
    pub timeout_seconds: u64,
    pub skip_tls_verify: bool,
    pub event_log_max_size: usize,
    pub event_ttl_hours: u64,
    pub dashboard_token: Option<SecretString>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            mideye_url: url.trim_end_matches('/').to_string(),
            mideye_api_key: SecretString::from(String::new()),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            skip_tls_verify: false,
            event_log_max_size: DEFAULT_EVENT_LOG_MAX_SIZE,
            event_ttl_hours: DEFAULT_EVENT_TTL_HOURS,
            dashboard_token: None,
        }
    }

    pub fn set_api_key(&mut self, api_key: SecretString) {
        self.mideye_api_key = api_key;
    }

    pub fn set_dashboard_token(&mut self, token: SecretString) {
        self.dashboard_token = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let url = "https://mideye.domain.local:8443".to_string();
        let args = GlobalArgs::new(url);
        assert_eq!(args.mideye_url, "https://mideye.domain.local:8443");
        assert_eq!(args.mideye_api_key.expose_secret(), "");
        assert_eq!(args.timeout_seconds, 120);
        assert!(!args.skip_tls_verify);
        assert!(args.dashboard_token.is_none());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let args = GlobalArgs::new("https://mideye.domain.local:8443//".to_string());
        assert_eq!(args.mideye_url, "https://mideye.domain.local:8443");
    }

    #[test]
    fn test_set_secrets() {
        let mut args = GlobalArgs::new("https://mideye.domain.local".to_string());
        args.set_api_key(SecretString::from("key".to_string()));
        args.set_dashboard_token(SecretString::from("token".to_string()));
        assert_eq!(args.mideye_api_key.expose_secret(), "key");
        assert_eq!(
            args.dashboard_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            Some("token".to_string())
        );
    }
}
