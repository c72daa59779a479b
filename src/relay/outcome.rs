use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Upstream code confirming the user approved the request on their phone.
pub const TOUCH_ACCEPTED: &str = "TOUCH_ACCEPTED";

/// Result of a single authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Accepted,
    Rejected { code: String },
    TransportError { message: String, timed_out: bool },
    ParseError { message: String },
}

impl VerificationOutcome {
    /// Map an extracted upstream code to an outcome.
    #[must_use]
    pub fn from_code(code: String) -> Self {
        if code == TOUCH_ACCEPTED {
            Self::Accepted
        } else {
            Self::Rejected { code }
        }
    }

    /// The upstream code, when one was received.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Accepted => Some(TOUCH_ACCEPTED),
            Self::Rejected { code } => Some(code),
            Self::TransportError { .. } | Self::ParseError { .. } => None,
        }
    }

    /// The failure description, for outcomes that did not produce a code.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::TransportError { message, .. } | Self::ParseError { message } => Some(message),
            Self::Accepted | Self::Rejected { .. } => None,
        }
    }

    /// Text shown to the user on the failure page.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Self::Accepted => None,
            Self::Rejected { code } => Some(code.clone()),
            Self::TransportError {
                timed_out: true, ..
            } => Some("TIMEOUT".to_string()),
            Self::TransportError { message, .. } => Some(format!("ERROR: {message}")),
            Self::ParseError { .. } => Some("PARSE_ERROR".to_string()),
        }
    }

    /// Coarse classification used by the event log counters.
    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Accepted => OutcomeKind::Success,
            Self::Rejected { code } if code.contains("TIMEOUT") || code.contains("EXPIRED") => {
                OutcomeKind::Timeout
            }
            Self::Rejected { .. } => OutcomeKind::Rejected,
            Self::TransportError {
                timed_out: true, ..
            } => OutcomeKind::Timeout,
            Self::TransportError { .. } | Self::ParseError { .. } => OutcomeKind::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Rejected,
    Timeout,
    Error,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::Rejected => "rejected",
            Self::Timeout => "timeout",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_code_sentinel_is_accepted() {
        assert_eq!(
            VerificationOutcome::from_code("TOUCH_ACCEPTED".to_string()),
            VerificationOutcome::Accepted
        );
    }

    #[test]
    fn from_code_is_case_sensitive() {
        assert_eq!(
            VerificationOutcome::from_code("touch_accepted".to_string()),
            VerificationOutcome::Rejected {
                code: "touch_accepted".to_string()
            }
        );
    }

    #[test]
    fn failure_messages() {
        assert_eq!(VerificationOutcome::Accepted.failure_message(), None);
        assert_eq!(
            VerificationOutcome::Rejected {
                code: "TOUCH_REJECTED".to_string()
            }
            .failure_message()
            .as_deref(),
            Some("TOUCH_REJECTED")
        );
        assert_eq!(
            VerificationOutcome::TransportError {
                message: "operation timed out".to_string(),
                timed_out: true
            }
            .failure_message()
            .as_deref(),
            Some("TIMEOUT")
        );
        assert_eq!(
            VerificationOutcome::TransportError {
                message: "connection refused".to_string(),
                timed_out: false
            }
            .failure_message()
            .as_deref(),
            Some("ERROR: connection refused")
        );
        assert_eq!(
            VerificationOutcome::ParseError {
                message: "no status code in response body".to_string()
            }
            .failure_message()
            .as_deref(),
            Some("PARSE_ERROR")
        );
    }

    #[test]
    fn kind_classifies_timeout_codes() {
        let expired = VerificationOutcome::Rejected {
            code: "TOUCH_EXPIRED".to_string(),
        };
        let timeout = VerificationOutcome::Rejected {
            code: "USER_TIMEOUT".to_string(),
        };
        let rejected = VerificationOutcome::Rejected {
            code: "TOUCH_REJECTED".to_string(),
        };
        assert_eq!(expired.kind(), OutcomeKind::Timeout);
        assert_eq!(timeout.kind(), OutcomeKind::Timeout);
        assert_eq!(rejected.kind(), OutcomeKind::Rejected);
        assert_eq!(VerificationOutcome::Accepted.kind(), OutcomeKind::Success);
    }

    #[test]
    fn code_and_error_message() {
        let parse = VerificationOutcome::ParseError {
            message: "bad".to_string(),
        };
        assert_eq!(parse.code(), None);
        assert_eq!(parse.error_message(), Some("bad"));
        assert_eq!(VerificationOutcome::Accepted.code(), Some(TOUCH_ACCEPTED));
        assert_eq!(VerificationOutcome::Accepted.error_message(), None);
    }

    #[test]
    fn kind_display_matches_serde() {
        assert_eq!(OutcomeKind::Timeout.to_string(), "timeout");
        assert_eq!(
            serde_json::to_string(&OutcomeKind::Success).ok().as_deref(),
            Some("\"success\"")
        );
    }
}
