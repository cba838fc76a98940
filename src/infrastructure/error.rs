use crate::domain::models::FailureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("http {status}{}", detail_suffix(.detail))]
    Http { status: u16, detail: Option<String> },
    #[error("no active playback device: {0}")]
    NoActiveDevice(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("lock poisoned: {0}")]
    Lock(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail.as_deref().map(str::trim) {
        Some(detail) if !detail.is_empty() => format!(": {detail}"),
        _ => String::new(),
    }
}

impl InfraError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Unauthorized(_) => FailureKind::Unauthorized,
            Self::Forbidden(_) => FailureKind::Forbidden,
            _ => FailureKind::Transient,
        }
    }

    /// Backend-provided detail, when the failure carried one.
    pub fn detail(&self) -> Option<&str> {
        let detail = match self {
            Self::Http { detail, .. } => detail.as_deref(),
            Self::NoActiveDevice(detail) => Some(detail.as_str()),
            _ => None,
        };
        detail.map(str::trim).filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_classify_by_kind() {
        assert_eq!(
            InfraError::Unauthorized("expired".to_string()).failure_kind(),
            FailureKind::Unauthorized
        );
        assert_eq!(
            InfraError::Forbidden("revoked".to_string()).failure_kind(),
            FailureKind::Forbidden
        );
        assert_eq!(
            InfraError::Http { status: 500, detail: None }.failure_kind(),
            FailureKind::Transient
        );
        assert_eq!(
            InfraError::Network("connection reset".to_string()).failure_kind(),
            FailureKind::Transient
        );
    }

    #[test]
    fn http_error_display_includes_detail_when_present() {
        let error = InfraError::Http {
            status: 502,
            detail: Some("upstream down".to_string()),
        };
        assert_eq!(error.to_string(), "http 502: upstream down");
        assert_eq!(error.detail(), Some("upstream down"));

        let bare = InfraError::Http { status: 500, detail: Some("  ".to_string()) };
        assert_eq!(bare.detail(), None);
    }

    #[test]
    fn lock_errors_are_transient_and_not_config_errors() {
        let error = InfraError::Lock("session: poisoned".to_string());
        assert_eq!(error.to_string(), "lock poisoned: session: poisoned");
        assert_eq!(error.failure_kind(), FailureKind::Transient);
        assert_eq!(error.detail(), None);
    }
}
