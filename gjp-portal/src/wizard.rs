//! Wizard Controller
//!
//! Five ordered steps: Details, Files, Contributors, Editor Notes, Review.
//! Each step edits a working copy of its draft. "Continue" writes the draft,
//! validates it and advances only if it is valid; "Save for Later" writes
//! without validating. Review re-reads every draft from storage and computes
//! readiness; submit is refused unless every section is ready.
//!
//! The current step is persisted so a new process resumes where the last one
//! stopped.

use crate::auth_gate::Route;
use crate::drafts::{DraftKey, DraftStore};
use crate::error::{PortalError, PortalResult};
use crate::gateway::{SubmissionGateway, SubmitReport};
use crate::models::{
    Contributor, ContributorList, SubmissionDetails, UploadCandidate, UploadedFile, UserProfile,
};
use crate::validation::{self, ReadinessReport, ValidationErrors};
use gjp_common::events::PortalEvent;
use gjp_common::time;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Details,
    Files,
    Contributors,
    EditorNotes,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Details,
        WizardStep::Files,
        WizardStep::Contributors,
        WizardStep::EditorNotes,
        WizardStep::Review,
    ];

    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Details => Some(WizardStep::Files),
            WizardStep::Files => Some(WizardStep::Contributors),
            WizardStep::Contributors => Some(WizardStep::EditorNotes),
            WizardStep::EditorNotes => Some(WizardStep::Review),
            WizardStep::Review => None,
        }
    }

    pub fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::Details => None,
            WizardStep::Files => Some(WizardStep::Details),
            WizardStep::Contributors => Some(WizardStep::Files),
            WizardStep::EditorNotes => Some(WizardStep::Contributors),
            WizardStep::Review => Some(WizardStep::EditorNotes),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::Details => "details",
            WizardStep::Files => "files",
            WizardStep::Contributors => "contributors",
            WizardStep::EditorNotes => "editor-notes",
            WizardStep::Review => "review",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Details => "Submission Details",
            WizardStep::Files => "Upload Files",
            WizardStep::Contributors => "Contributors",
            WizardStep::EditorNotes => "Comments for the Editor",
            WizardStep::Review => "Review",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = gjp_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        WizardStep::ALL
            .into_iter()
            .find(|step| step.as_str() == normalized)
            .or(match normalized.as_str() {
                "notes" | "editornotes" => Some(WizardStep::EditorNotes),
                _ => None,
            })
            .ok_or_else(|| gjp_common::Error::InvalidInput(format!("unknown wizard step: {}", s)))
    }
}

/// A confirmed submission and where to go next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub report: SubmitReport,
    pub next: Route,
}

/// Drives the five-step submission flow over the [`DraftStore`]
pub struct SubmissionWizard {
    drafts: DraftStore,
    step: WizardStep,
    details: SubmissionDetails,
    files: Vec<UploadedFile>,
    contributors: ContributorList,
    editor_notes: String,
    readiness: Option<ReadinessReport>,
}

impl SubmissionWizard {
    /// Resume at the persisted step, or Details when none is stored or the
    /// stored step is no longer reachable
    pub fn open(drafts: DraftStore) -> Self {
        let mut wizard = Self {
            step: WizardStep::Details,
            details: drafts.load_details(),
            files: drafts.load_files(),
            contributors: drafts.load_contributors(),
            editor_notes: drafts.load_editor_notes(),
            readiness: None,
            drafts,
        };

        if let Some(raw) = wizard.drafts.load_wizard_step() {
            match raw.parse::<WizardStep>() {
                Ok(step) => match wizard.first_blocking_step(step) {
                    None => wizard.step = step,
                    Some(blocking) => {
                        warn!(stored = %step, blocking = %blocking, "Stored wizard step no longer reachable");
                    }
                },
                Err(e) => warn!("Ignoring stored wizard step: {}", e),
            }
        }

        if wizard.step == WizardStep::Review {
            wizard.readiness = Some(validation::assess_readiness(&wizard.drafts.load_all()));
        }

        debug!(step = %wizard.step, "Wizard opened");
        wizard
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn details(&self) -> &SubmissionDetails {
        &self.details
    }

    pub fn set_details(&mut self, details: SubmissionDetails) {
        self.details = details;
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn contributors(&self) -> &ContributorList {
        &self.contributors
    }

    pub fn contributors_mut(&mut self) -> &mut ContributorList {
        &mut self.contributors
    }

    pub fn editor_notes(&self) -> &str {
        &self.editor_notes
    }

    pub fn set_editor_notes(&mut self, notes: impl Into<String>) {
        self.editor_notes = notes.into();
    }

    pub fn submission_id(&self) -> Option<String> {
        self.drafts.current_submission_id()
    }

    /// Readiness computed the last time Review was entered
    pub fn readiness(&self) -> Option<&ReadinessReport> {
        self.readiness.as_ref()
    }

    /// Move to `target`
    ///
    /// Backward moves are always allowed. Forward moves require every earlier
    /// step's stored draft to validate. The target's draft is reloaded.
    pub fn enter(&mut self, target: WizardStep) -> PortalResult<()> {
        if target > self.step {
            if let Some(blocking) = self.first_blocking_step(target) {
                return Err(PortalError::StepLocked { target, blocking });
            }
        }
        self.move_to(target)
    }

    /// Write the current step's draft, validate, and advance if valid
    pub fn continue_step(&mut self) -> PortalResult<WizardStep> {
        let Some(next) = self.step.next() else {
            debug!("Continue on review is a no-op; use submit");
            return Ok(self.step);
        };

        self.write_current()?;
        navigation_check(self.step, &self.snapshot_of(self.step))?;

        if self.step == WizardStep::Details {
            let id = self.drafts.ensure_submission_id(time::now())?;
            debug!(submission_id = %id, "Submission id in use");
        }

        self.move_to(next)?;
        Ok(next)
    }

    /// Write the current step's draft without validating or advancing
    pub fn save_for_later(&mut self) -> PortalResult<()> {
        self.write_current()?;
        info!(step = %self.step, "Draft saved for later");
        Ok(())
    }

    /// Step back one; stays on Details
    pub fn back(&mut self) -> PortalResult<WizardStep> {
        if let Some(previous) = self.step.previous() {
            self.move_to(previous)?;
        }
        Ok(self.step)
    }

    /// Enter Review and recompute readiness from storage
    pub fn review(&mut self) -> PortalResult<ReadinessReport> {
        self.enter(WizardStep::Review)?;
        let report = match &self.readiness {
            Some(report) => report.clone(),
            None => validation::assess_readiness(&self.drafts.load_all()),
        };
        Ok(report)
    }

    /// Seed the contributor list from the user's profile when it is empty
    ///
    /// Returns true if a contributor was added; the first contributor becomes
    /// primary contact.
    pub fn prefill_contributor_from_profile(&mut self, profile: &UserProfile) -> bool {
        if !self.contributors.is_empty() {
            return false;
        }
        self.contributors.add(Contributor::from_profile(profile));
        debug!(user_id = %profile.id, "Contributor prefilled from profile");
        true
    }

    /// Validate and upload one local file, appending it to the Files draft
    ///
    /// The updated file list is written immediately so a failed later upload
    /// does not lose earlier ones.
    pub async fn upload(
        &mut self,
        gateway: &SubmissionGateway,
        path: &Path,
    ) -> PortalResult<UploadedFile> {
        let candidate = UploadCandidate::inspect(path)?;
        validation::validate_upload(&candidate)?;

        let uploaded = gateway.upload(candidate).await?;
        self.files.push(uploaded.clone());
        self.drafts.save_step_draft(DraftKey::Files, &self.files)?;
        Ok(uploaded)
    }

    /// Push the stored contributor list to the backend for the current
    /// submission id; returns false when there is no id yet
    pub async fn sync_contributors(&self, gateway: &SubmissionGateway) -> PortalResult<bool> {
        let Some(submission_id) = self.drafts.current_submission_id() else {
            return Ok(false);
        };
        let contributors = self.drafts.load_contributors();
        gateway.save_contributors(&submission_id, &contributors).await?;
        debug!(submission_id = %submission_id, count = contributors.len(), "Contributors synced");
        Ok(true)
    }

    /// Drop an uploaded file reference from the working copy
    pub fn remove_file(&mut self, index: usize) -> PortalResult<UploadedFile> {
        if index >= self.files.len() {
            let mut errors = ValidationErrors::new();
            errors.push("files", format!("No file at position {}", index + 1));
            return Err(errors.into());
        }
        Ok(self.files.remove(index))
    }

    /// Submit the stored drafts
    ///
    /// Only allowed from Review with every section ready. On success all
    /// drafts are cleared and the wizard restarts at Details; on failure the
    /// drafts stay as they were.
    pub async fn submit(&mut self, gateway: &SubmissionGateway) -> PortalResult<Submitted> {
        if self.step != WizardStep::Review {
            return Err(PortalError::NotAtReview);
        }

        let draft = self.drafts.load_all();
        let report = validation::assess_readiness(&draft);
        self.readiness = Some(report.clone());
        if !report.is_ready() {
            warn!(
                details = report.details,
                files = report.files,
                contributors = report.contributors,
                editor_notes = report.editor_notes,
                "Submit refused: submission incomplete"
            );
            return Err(PortalError::NotReady(report));
        }

        let result = gateway.submit(&draft).await?;

        self.drafts.clear_all_drafts()?;
        self.drafts
            .event_bus()
            .emit_lossy(PortalEvent::SubmissionCompleted {
                submission_id: result
                    .receipt
                    .submission_id
                    .clone()
                    .or(draft.submission_id.clone()),
                attempts: result.attempts,
                timestamp: time::now(),
            });

        self.details = SubmissionDetails::default();
        self.files.clear();
        self.contributors = ContributorList::new();
        self.editor_notes.clear();
        self.readiness = None;
        self.step = WizardStep::Details;

        info!(attempts = result.attempts, "Submission complete, drafts cleared");
        Ok(Submitted {
            report: result,
            next: Route::Submissions,
        })
    }

    fn move_to(&mut self, target: WizardStep) -> PortalResult<()> {
        self.reload(target);
        self.step = target;
        self.readiness = if target == WizardStep::Review {
            Some(validation::assess_readiness(&self.drafts.load_all()))
        } else {
            None
        };
        self.drafts.save_wizard_step(target.as_str())?;
        debug!(step = %target, "Wizard step entered");
        Ok(())
    }

    fn reload(&mut self, step: WizardStep) {
        match step {
            WizardStep::Details => self.details = self.drafts.load_details(),
            WizardStep::Files => self.files = self.drafts.load_files(),
            WizardStep::Contributors => self.contributors = self.drafts.load_contributors(),
            WizardStep::EditorNotes => self.editor_notes = self.drafts.load_editor_notes(),
            WizardStep::Review => {}
        }
    }

    fn write_current(&self) -> PortalResult<()> {
        match self.step {
            WizardStep::Details => self.drafts.save_step_draft(DraftKey::Details, &self.details)?,
            WizardStep::Files => self.drafts.save_step_draft(DraftKey::Files, &self.files)?,
            WizardStep::Contributors => self
                .drafts
                .save_step_draft(DraftKey::Contributors, &self.contributors)?,
            WizardStep::EditorNotes => self
                .drafts
                .save_step_draft(DraftKey::EditorNotes, self.editor_notes.as_str())?,
            WizardStep::Review => {}
        }
        Ok(())
    }

    fn snapshot_of(&self, step: WizardStep) -> StepDraft {
        match step {
            WizardStep::Details => StepDraft::Details(self.details.clone()),
            WizardStep::Files => StepDraft::Files(self.files.clone()),
            WizardStep::Contributors => StepDraft::Contributors(self.contributors.clone()),
            WizardStep::EditorNotes => StepDraft::EditorNotes(self.editor_notes.clone()),
            WizardStep::Review => StepDraft::None,
        }
    }

    /// First step before `target` whose stored draft fails navigation checks
    fn first_blocking_step(&self, target: WizardStep) -> Option<WizardStep> {
        WizardStep::ALL
            .into_iter()
            .take_while(|step| *step < target)
            .find(|step| {
                let stored = match step {
                    WizardStep::Details => StepDraft::Details(self.drafts.load_details()),
                    WizardStep::Files => StepDraft::Files(self.drafts.load_files()),
                    WizardStep::Contributors => {
                        StepDraft::Contributors(self.drafts.load_contributors())
                    }
                    WizardStep::EditorNotes => StepDraft::None,
                    WizardStep::Review => StepDraft::None,
                };
                navigation_check(*step, &stored).is_err()
            })
    }
}

/// One step's draft, for validation
enum StepDraft {
    Details(SubmissionDetails),
    Files(Vec<UploadedFile>),
    Contributors(ContributorList),
    EditorNotes(String),
    None,
}

/// Checks that gate leaving `step` forward; editor notes are optional here
fn navigation_check(step: WizardStep, draft: &StepDraft) -> Result<(), ValidationErrors> {
    match (step, draft) {
        (WizardStep::Details, StepDraft::Details(d)) => validation::validate_details(d),
        (WizardStep::Files, StepDraft::Files(f)) => validation::validate_files(f),
        (WizardStep::Contributors, StepDraft::Contributors(c)) => {
            validation::validate_contributors(c)
        }
        _ => Ok(()),
    }
}
