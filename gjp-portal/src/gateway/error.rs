//! Backend call failures

use crate::session::SessionError;
use thiserror::Error;

/// Failure of one backend operation
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failure: unreachable host, timeout, connection reset
    #[error("Network error: {0}")]
    Network(String),

    /// 401 / 403
    #[error("Authentication rejected ({status}): {message}")]
    AuthRejected { status: u16, message: String },

    /// 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-2xx status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// 2xx envelope with `success: false`
    #[error("Rejected by backend: {0}")]
    Rejected(String),

    /// Body did not match the expected envelope
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Raised locally before transmission
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Local storage error: {0}")]
    Storage(#[from] gjp_common::Error),
}

impl GatewayError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Network(_) | GatewayError::Server { .. } | GatewayError::Rejected(_)
        )
    }

    /// Failures that invalidate the stored session
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, GatewayError::AuthRejected { .. })
    }

    /// Text shown to the user at the CLI boundary
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Network(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            GatewayError::AuthRejected { .. } => {
                "Your session is no longer valid. Please log in again.".to_string()
            }
            GatewayError::NotFound(_) => "The requested resource was not found.".to_string(),
            GatewayError::Server { .. } => {
                "The server encountered an error. Please try again later.".to_string()
            }
            GatewayError::Rejected(message) if !message.trim().is_empty() => message.clone(),
            GatewayError::Rejected(_) => "The request was not accepted.".to_string(),
            GatewayError::MalformedResponse(_) => {
                "Unexpected response from the server.".to_string()
            }
            GatewayError::Session(e) => e.to_string(),
            GatewayError::Storage(_) => "Could not access local storage.".to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::MalformedResponse(e.to_string())
        } else {
            GatewayError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(GatewayError::Network("down".into()).is_retryable());
        assert!(GatewayError::Rejected("busy".into()).is_retryable());
        assert!(GatewayError::Server {
            status: 500,
            message: String::new()
        }
        .is_retryable());

        let auth = GatewayError::AuthRejected {
            status: 401,
            message: String::new(),
        };
        assert!(!auth.is_retryable());
        assert!(auth.is_auth_failure());
        assert!(!GatewayError::NotFound("x".into()).is_retryable());
        assert!(!GatewayError::Session(SessionError::NotLoggedIn).is_retryable());
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let errors = [
            GatewayError::Network("x".into()),
            GatewayError::AuthRejected {
                status: 401,
                message: "x".into(),
            },
            GatewayError::NotFound("x".into()),
            GatewayError::Server {
                status: 500,
                message: "x".into(),
            },
            GatewayError::Rejected(String::new()),
            GatewayError::MalformedResponse("x".into()),
            GatewayError::Session(SessionError::NotLoggedIn),
        ];
        let mut messages: Vec<String> = errors.iter().map(|e| e.user_message()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), errors.len());
    }

    #[test]
    fn test_backend_message_surfaces() {
        let e = GatewayError::Rejected("Invalid credentials".into());
        assert_eq!(e.user_message(), "Invalid credentials");
    }
}
