//! Errors raised while delivering a notification.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// The endpoint answered with a non-success status.
    #[error("notification rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The delivery did not finish within the configured timeout.
    #[error("notification timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// DNS, refused connection, TLS and similar transport failures.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display() {
        let err = NotifyError::Rejected {
            status: 503,
            message: "mailer down".into(),
        };
        assert_eq!(err.to_string(), "notification rejected (status 503): mailer down");
    }

    #[test]
    fn timeout_display() {
        let err = NotifyError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "notification timed out after 5000ms");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NotifyError>();
    }
}
