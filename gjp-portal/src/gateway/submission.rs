//! Submission-facing backend operations
//!
//! Every call that transmits the user id first checks the session locally;
//! an expired or missing session never reaches the network.

use super::{
    call_with_retry, Ack, GatewayResult, PortalBackend, RetryPolicy, SubmissionReceipt,
};
use crate::models::{
    ContributorList, SubmissionDraft, SubmissionSummary, UploadCandidate, UploadedFile,
};
use crate::session::{Session, SessionToken};
use gjp_common::time;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a confirmed submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    pub receipt: SubmissionReceipt,
    /// Backend calls made, including the successful one
    pub attempts: u32,
}

/// Session-checked, retried access to the submission endpoints
#[derive(Clone)]
pub struct SubmissionGateway {
    backend: Arc<dyn PortalBackend>,
    session: Session,
    policy: RetryPolicy,
}

impl SubmissionGateway {
    pub fn new(backend: Arc<dyn PortalBackend>, session: Session, policy: RetryPolicy) -> Self {
        Self {
            backend,
            session,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn require_session(&self) -> GatewayResult<SessionToken> {
        Ok(self.session.require_valid(time::now())?)
    }

    /// Post the aggregated draft to `make_submission.php`
    ///
    /// Retries transient failures up to the policy's attempt budget. The
    /// drafts are left untouched; clearing them is the caller's job once this
    /// returns `Ok`.
    pub async fn submit(&self, draft: &SubmissionDraft) -> GatewayResult<SubmitReport> {
        let token = self.require_session()?;

        let mut payload = draft.to_payload();
        payload.submitted_by = Some(token.id.clone());
        let payload = &payload;

        info!(
            user_id = %token.id,
            submission_id = ?payload.submission_id,
            files = payload.files.len(),
            contributors = payload.contributors.len(),
            "Submitting manuscript"
        );

        let (receipt, attempts) = call_with_retry(
            &self.session,
            self.policy,
            "make_submission",
            || self.backend.make_submission(payload),
        )
        .await?;

        info!(attempts, submission_id = ?receipt.submission_id, "Submission accepted");
        Ok(SubmitReport { receipt, attempts })
    }

    /// Submissions made by the logged-in user
    pub async fn list(&self) -> GatewayResult<Vec<SubmissionSummary>> {
        let token = self.require_session()?;
        let user_id = token.id.as_str();
        let (list, _) = call_with_retry(&self.session, self.policy, "get_submissions", || {
            self.backend.list_submissions(user_id)
        })
        .await?;
        Ok(list)
    }

    pub async fn delete(&self, submission_id: &str) -> GatewayResult<Ack> {
        self.require_session()?;
        let (ack, _) = call_with_retry(&self.session, self.policy, "delete_submission", || {
            self.backend.delete_submission(submission_id)
        })
        .await?;
        info!(submission_id, "Submission deleted");
        Ok(ack)
    }

    /// Upload one validated file; a single attempt
    pub async fn upload(&self, candidate: UploadCandidate) -> GatewayResult<UploadedFile> {
        let token = self.require_session()?;
        let user_id = token.id.as_str();
        let candidate_ref = &candidate;

        let (server_name, _) = call_with_retry(
            &self.session,
            RetryPolicy::once(),
            "upload",
            || self.backend.upload_file(user_id, candidate_ref),
        )
        .await
        .map_err(|e| {
            warn!(file = %candidate_ref.file_name, error = %e, "Upload failed");
            e
        })?;

        info!(file = %candidate.file_name, server_file_name = %server_name, "File uploaded");
        Ok(candidate.into_uploaded(server_name))
    }

    pub async fn save_contributors(
        &self,
        submission_id: &str,
        contributors: &ContributorList,
    ) -> GatewayResult<Ack> {
        self.require_session()?;
        let (ack, _) = call_with_retry(&self.session, self.policy, "save_contributors", || {
            self.backend.save_contributors(submission_id, contributors)
        })
        .await?;
        Ok(ack)
    }

    /// Register a new submission title for the logged-in user
    pub async fn create_title(&self, title: &str) -> GatewayResult<Ack> {
        let token = self.require_session()?;
        let user_id = token.id.as_str();
        let (ack, _) = call_with_retry(&self.session, self.policy, "title_submission", || {
            self.backend.create_submission(title, user_id)
        })
        .await?;
        Ok(ack)
    }
}
