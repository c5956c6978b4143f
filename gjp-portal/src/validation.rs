//! Validation
//!
//! Field presence and format checks. Step validators gate forward navigation
//! in the wizard; [`assess_readiness`] combines them for the review step.
//! Account form validators run before any request is built, so validation
//! errors never reach the network.

use crate::models::{
    ContributorList, ProfileUpdate, Registration, SubmissionDetails, SubmissionDraft,
    UploadCandidate, UploadedFile, ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES,
};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static ORCID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://orcid\.org/)?\d{4}-\d{4}-\d{4}-\d{3}[\dX]$")
        .expect("ORCID pattern compiles")
});

/// Minimum password length for new accounts and password changes
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// `0000-0002-1825-0097` or the same behind `https://orcid.org/`
pub fn is_valid_orcid(orcid: &str) -> bool {
    ORCID_RE.is_match(orcid.trim())
}

/// One failed check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every failed check of one form
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.summary())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    /// True if some error is attached to `field`
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    /// `field: message` pairs joined with `; `
    fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// `Ok(())` when nothing failed
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn validate_details(details: &SubmissionDetails) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if blank(&details.title) {
        errors.push("title", "Title is required");
    }
    if blank(&details.abstract_text) {
        errors.push("abstract", "Abstract is required");
    }
    errors.into_result()
}

pub fn validate_files(files: &[UploadedFile]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !files.iter().any(|f| !blank(&f.server_file_name)) {
        errors.push("files", "Upload at least one file");
    }
    errors.into_result()
}

/// At least one contributor, each with given name and valid email, and at
/// most one primary contact. Zero primary contacts is accepted. ORCID iDs are
/// free text here; a placeholder such as "pending" does not block readiness.
pub fn validate_contributors(contributors: &ContributorList) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if contributors.is_empty() {
        errors.push("contributors", "Add at least one contributor");
    }

    for (i, c) in contributors.iter().enumerate() {
        if blank(&c.given_name) {
            errors.push(format!("contributors[{}].givenName", i), "Given name is required");
        }
        if !is_valid_email(&c.email) {
            errors.push(format!("contributors[{}].email", i), "A valid email is required");
        }
    }

    if contributors.primary_contact_count() > 1 {
        errors.push("contributors", "Only one contributor can be the primary contact");
    }

    errors.into_result()
}

/// Editor notes are optional to move past, but required for readiness
pub fn validate_editor_notes(notes: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if blank(notes) {
        errors.push("editorComments", "Comments for the editor are required before submitting");
    }
    errors.into_result()
}

/// Extension and size checks before a file is sent to the upload endpoint
pub fn validate_upload(candidate: &UploadCandidate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let allowed = candidate
        .extension()
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    if !allowed {
        errors.push("file", "Only DOC or DOCX files are allowed");
    }
    if candidate.size > MAX_UPLOAD_BYTES {
        errors.push("file", "File size exceeds the maximum limit of 50MB");
    }
    errors.into_result()
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if blank(email) || password.is_empty() {
        errors.push("credentials", "Please enter both email and password");
    }
    errors.into_result()
}

pub fn validate_registration(form: &Registration) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if blank(&form.given_name) {
        errors.push("givenName", "Required");
    }
    if blank(&form.family_name) {
        errors.push("familyName", "Required");
    }
    if blank(&form.email) {
        errors.push("email", "Required");
    } else if !is_valid_email(&form.email) {
        errors.push("email", "Email is invalid");
    }
    if blank(&form.username) {
        errors.push("username", "Required");
    }
    if form.password.is_empty() {
        errors.push("password", "Required");
    } else if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("password", "Password must be at least 8 characters");
    }
    if form.confirm_password.is_empty() {
        errors.push("confirmPassword", "Required");
    } else if form.password != form.confirm_password {
        errors.push("confirmPassword", "Passwords do not match");
    }
    if let Some(orcid) = form.orcid_id.as_deref() {
        if !blank(orcid) && !is_valid_orcid(orcid) {
            errors.push("orcidId", "ORCID iD is not well formed");
        }
    }
    if !form.agree_to_privacy {
        errors.push("agreeToPrivacy", "You must agree to privacy policy");
    }

    errors.into_result()
}

pub fn validate_profile_update(form: &ProfileUpdate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if blank(&form.given_name) {
        errors.push("givenName", "Given name is required");
    }
    if !is_valid_email(&form.email) {
        errors.push("email", "A valid email is required");
    }

    if form.changes_password() {
        let new_password = form.new_password.as_deref().unwrap_or_default();
        if form.current_password.as_deref().map(str::is_empty).unwrap_or(true) {
            errors.push("currentPassword", "Current password is required to set a new one");
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            errors.push("newPassword", "Password must be at least 8 characters");
        }
        if form.confirm_password.as_deref() != Some(new_password) {
            errors.push("confirmPassword", "Passwords do not match");
        }
    }

    errors.into_result()
}

pub fn validate_password_reset(password: &str, confirm: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if password.is_empty() {
        errors.push("password", "Required");
    } else if password != confirm {
        errors.push("confirmPassword", "Passwords do not match!");
    }
    errors.into_result()
}

/// Per-section result of the review step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessReport {
    pub details: bool,
    pub files: bool,
    pub contributors: bool,
    pub editor_notes: bool,
    pub errors: ValidationErrors,
}

impl ReadinessReport {
    /// Logical AND of all four sections
    pub fn is_ready(&self) -> bool {
        self.details && self.files && self.contributors && self.editor_notes
    }
}

/// Validate every section of an aggregated draft
pub fn assess_readiness(draft: &SubmissionDraft) -> ReadinessReport {
    let mut errors = ValidationErrors::new();
    let mut check = |result: Result<(), ValidationErrors>| match result {
        Ok(()) => true,
        Err(e) => {
            errors.extend(e);
            false
        }
    };

    let details = check(validate_details(&draft.details));
    let files = check(validate_files(&draft.files));
    let contributors = check(validate_contributors(&draft.contributors));
    let editor_notes = check(validate_editor_notes(&draft.editor_notes));

    ReadinessReport {
        details,
        files,
        contributors,
        editor_notes,
        errors,
    }
}
