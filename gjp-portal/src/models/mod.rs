//! Data models exchanged with the backend and persisted as drafts
//!
//! Field names on the wire follow the backend's camelCase JSON; Rust fields
//! stay snake_case with serde renames.

pub mod account;
pub mod contributor;
pub mod details;
pub mod files;
pub mod submission;

pub use account::{
    Credentials, LoginGrant, ProfileUpdate, ProfileUpdateRequest, RegisterRequest, Registration,
    UserProfile,
};
pub use contributor::{Contributor, ContributorList};
pub use details::{parse_keywords, SubmissionDetails};
pub use files::{FileCategory, UploadCandidate, UploadedFile, ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES};
pub use submission::{SubmissionDraft, SubmissionPayload, SubmissionSummary};

use serde::{Deserialize, Deserializer};

/// The backend returns ids sometimes as JSON numbers, sometimes as strings
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}

/// Like [`string_or_number`] but `null`/missing maps to `None`
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    }))
}

/// Treat JSON `null` as the type's default
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
