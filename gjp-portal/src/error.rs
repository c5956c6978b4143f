//! Portal-level error type

use crate::gateway::GatewayError;
use crate::session::SessionError;
use crate::validation::{ReadinessReport, ValidationErrors};
use crate::wizard::WizardStep;
use thiserror::Error;

/// Result alias for portal operations
pub type PortalResult<T> = std::result::Result<T, PortalError>;

/// Anything a portal operation can fail with
#[derive(Debug, Error)]
pub enum PortalError {
    /// Local field checks failed; nothing was sent
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Submit attempted while some section is incomplete
    #[error("Submission is incomplete")]
    NotReady(ReadinessReport),

    /// Forward jump past a step whose stored draft does not validate
    #[error("Cannot open {target} before {blocking} is complete")]
    StepLocked {
        target: WizardStep,
        blocking: WizardStep,
    },

    #[error("Submit is only available from the review step")]
    NotAtReview,

    /// The auth gate refused a protected operation
    #[error("Please login to access this page")]
    NotAuthenticated,

    #[error(transparent)]
    Storage(#[from] gjp_common::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<SessionError> for PortalError {
    fn from(e: SessionError) -> Self {
        PortalError::Gateway(GatewayError::Session(e))
    }
}

impl PortalError {
    /// Text shown to the user at the CLI boundary
    pub fn user_message(&self) -> String {
        match self {
            PortalError::Validation(errors) => errors
                .iter()
                .map(|e| e.message.clone())
                .collect::<Vec<_>>()
                .join("\n"),
            PortalError::NotReady(report) => {
                let mut missing = Vec::new();
                if !report.details {
                    missing.push("submission details");
                }
                if !report.files {
                    missing.push("uploaded files");
                }
                if !report.contributors {
                    missing.push("contributors");
                }
                if !report.editor_notes {
                    missing.push("comments for the editor");
                }
                format!(
                    "Please complete all required sections before submitting: {}",
                    missing.join(", ")
                )
            }
            PortalError::Storage(gjp_common::Error::NotFound(what)) => {
                format!("No {} in the current draft", what)
            }
            PortalError::Storage(gjp_common::Error::InvalidInput(message)) => message.clone(),
            PortalError::Storage(gjp_common::Error::Io(e)) => format!("File error: {}", e),
            PortalError::Storage(_) => "Could not access local storage.".to_string(),
            PortalError::Gateway(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    /// True when the user has to log in again
    pub fn requires_login(&self) -> bool {
        match self {
            PortalError::NotAuthenticated => true,
            PortalError::Gateway(GatewayError::Session(_)) => true,
            PortalError::Gateway(e) => e.is_auth_failure(),
            _ => false,
        }
    }
}
