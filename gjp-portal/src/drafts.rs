//! Draft Store
//!
//! Per-step local persistence for the submission wizard. Each step owns one
//! well-known key; the review step reads all of them back. The store never
//! talks to the network.
//!
//! Reads are total: a missing, unreadable or malformed record yields the
//! step's default value and a warn-level log line, never an error.

use crate::models::{ContributorList, SubmissionDetails, SubmissionDraft, UploadedFile};
use chrono::{DateTime, Utc};
use gjp_common::events::{EventBus, PortalEvent};
use gjp_common::{time, LocalStore, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key of the locally generated (or resumed) submission identifier
pub const SUBMISSION_ID_KEY: &str = "currentSubmissionId";

/// Key of the persisted wizard position
pub const WIZARD_STEP_KEY: &str = "submissionWizardStep";

/// Storage keys owned by the wizard steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftKey {
    Details,
    Files,
    Contributors,
    EditorNotes,
}

impl DraftKey {
    pub const ALL: [DraftKey; 4] = [
        DraftKey::Details,
        DraftKey::Files,
        DraftKey::Contributors,
        DraftKey::EditorNotes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftKey::Details => "submissionDetails",
            DraftKey::Files => "submissionFiles",
            DraftKey::Contributors => "submissionContributors",
            DraftKey::EditorNotes => "submissionEditorComments",
        }
    }
}

/// Wizard draft persistence over a [`LocalStore`]
#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn LocalStore>,
    events: EventBus,
}

impl DraftStore {
    pub fn new(store: Arc<dyn LocalStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Serialize `value` under the step's key
    pub fn save_step_draft<T: Serialize + ?Sized>(&self, key: DraftKey, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key.as_str(), &json)?;
        debug!(key = key.as_str(), bytes = json.len(), "Draft saved");
        self.events.emit_lossy(PortalEvent::DraftSaved {
            key: key.as_str().to_string(),
            timestamp: time::now(),
        });
        Ok(())
    }

    /// Stored value for the step, or `T::default()` when absent or malformed
    pub fn load_step_draft<T: DeserializeOwned + Default>(&self, key: DraftKey) -> T {
        let raw = match self.store.get(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                warn!(key = key.as_str(), "Failed to read draft, using defaults: {}", e);
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = key.as_str(), "Malformed draft treated as absent: {}", e);
                T::default()
            }
        }
    }

    pub fn load_details(&self) -> SubmissionDetails {
        self.load_step_draft(DraftKey::Details)
    }

    pub fn load_files(&self) -> Vec<UploadedFile> {
        self.load_step_draft(DraftKey::Files)
    }

    pub fn load_contributors(&self) -> ContributorList {
        self.load_step_draft(DraftKey::Contributors)
    }

    pub fn load_editor_notes(&self) -> String {
        self.load_step_draft(DraftKey::EditorNotes)
    }

    /// Read every step draft fresh from storage
    pub fn load_all(&self) -> SubmissionDraft {
        SubmissionDraft {
            details: self.load_details(),
            files: self.load_files(),
            contributors: self.load_contributors(),
            editor_notes: self.load_editor_notes(),
            submission_id: self.current_submission_id(),
        }
    }

    /// Remove every step draft, the submission id and the wizard position
    ///
    /// Only called once the backend has confirmed a submission.
    pub fn clear_all_drafts(&self) -> Result<()> {
        for key in DraftKey::ALL {
            self.store.remove(key.as_str())?;
        }
        self.store.remove(SUBMISSION_ID_KEY)?;
        self.store.remove(WIZARD_STEP_KEY)?;
        info!("All submission drafts cleared");
        self.events.emit_lossy(PortalEvent::DraftsCleared {
            timestamp: time::now(),
        });
        Ok(())
    }

    pub fn current_submission_id(&self) -> Option<String> {
        match self.store.get(SUBMISSION_ID_KEY) {
            Ok(id) => id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) => {
                warn!("Failed to read current submission id: {}", e);
                None
            }
        }
    }

    /// Point the drafts at an existing submission (e.g. resuming from the list)
    pub fn set_submission_id(&self, id: &str) -> Result<()> {
        self.store.set(SUBMISSION_ID_KEY, id)
    }

    /// Return the current submission id, generating one from `now` if absent
    pub fn ensure_submission_id(&self, now: DateTime<Utc>) -> Result<String> {
        if let Some(id) = self.current_submission_id() {
            return Ok(id);
        }
        let id = time::epoch_millis_string(now);
        self.store.set(SUBMISSION_ID_KEY, &id)?;
        debug!(submission_id = %id, "Generated submission id");
        Ok(id)
    }

    pub(crate) fn event_bus(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn load_wizard_step(&self) -> Option<String> {
        match self.store.get(WIZARD_STEP_KEY) {
            Ok(step) => step,
            Err(e) => {
                warn!("Failed to read saved wizard step: {}", e);
                None
            }
        }
    }

    pub(crate) fn save_wizard_step(&self, step: &str) -> Result<()> {
        self.store.set(WIZARD_STEP_KEY, step)
    }
}
