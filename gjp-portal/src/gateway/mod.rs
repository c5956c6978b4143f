//! Submission Gateway
//!
//! [`PortalBackend`] is the seam between the portal logic and the journal
//! backend. [`HttpBackend`] talks to the PHP endpoints over HTTP; tests drive
//! the same trait with in-process fakes. [`SubmissionGateway`] layers the
//! session checks and the bounded retry policy on top.

pub mod error;
pub mod http;
pub mod retry;
pub mod submission;

pub use error::GatewayError;
pub use http::HttpBackend;
pub use retry::{RetryOutcome, RetryPolicy};
pub use submission::{SubmissionGateway, SubmitReport};

use crate::models::{
    Credentials, ContributorList, LoginGrant, ProfileUpdateRequest, RegisterRequest,
    SubmissionPayload, SubmissionSummary, UploadCandidate, UserProfile,
};
use crate::session::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Result alias for backend calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Message part of a successful envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Successful `make_submission.php` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(
        default,
        alias = "submissionId",
        alias = "id",
        deserialize_with = "crate::models::opt_string_or_number"
    )]
    pub submission_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One method per backend endpoint
///
/// Implementations perform exactly one attempt per call; retry and session
/// policy live in the callers.
#[async_trait]
pub trait PortalBackend: Send + Sync {
    /// `login.php`
    async fn login(&self, credentials: &Credentials) -> GatewayResult<LoginGrant>;

    /// `register.php`
    async fn register(&self, request: &RegisterRequest) -> GatewayResult<Ack>;

    /// `get_profile.php`
    async fn get_profile(&self, user_id: &str) -> GatewayResult<UserProfile>;

    /// `update_profile.php` (PUT)
    async fn update_profile(&self, request: &ProfileUpdateRequest) -> GatewayResult<Ack>;

    /// `title_submission.php`
    async fn create_submission(&self, title: &str, submitted_by: &str) -> GatewayResult<Ack>;

    /// `make_submission.php`
    async fn make_submission(&self, payload: &SubmissionPayload)
        -> GatewayResult<SubmissionReceipt>;

    /// `get_submissions.php?submitted_by=<id>`
    async fn list_submissions(&self, submitted_by: &str) -> GatewayResult<Vec<SubmissionSummary>>;

    /// `delete_submission.php`
    async fn delete_submission(&self, submission_id: &str) -> GatewayResult<Ack>;

    /// `save_contributors.php`
    async fn save_contributors(
        &self,
        submission_id: &str,
        contributors: &ContributorList,
    ) -> GatewayResult<Ack>;

    /// `upload.php`; returns the server-assigned filename
    async fn upload_file(&self, user_id: &str, file: &UploadCandidate) -> GatewayResult<String>;

    /// `reset.php?action=request`
    async fn request_password_reset(&self, email: &str) -> GatewayResult<Ack>;

    /// `reset.php?action=reset`
    async fn confirm_password_reset(&self, token: &str, password: &str) -> GatewayResult<Ack>;
}

/// Run one backend operation under `policy`, dropping the session on an
/// authentication failure. Returns the value and the number of attempts.
pub(crate) async fn call_with_retry<T, F, Fut>(
    session: &Session,
    policy: RetryPolicy,
    operation_name: &str,
    operation: F,
) -> GatewayResult<(T, u32)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    match policy
        .run(operation_name, GatewayError::is_retryable, operation)
        .await
    {
        RetryOutcome::Succeeded { value, attempts } => Ok((value, attempts)),
        RetryOutcome::Failed { error, attempts } => {
            if error.is_auth_failure() {
                tracing::warn!(
                    operation = operation_name,
                    attempts,
                    "Backend rejected credentials, clearing session"
                );
                session.clear_token()?;
            }
            Err(error)
        }
    }
}
