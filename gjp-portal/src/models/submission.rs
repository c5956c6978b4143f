//! Aggregated submission draft and backend payloads

use super::{
    contributor::{Contributor, ContributorList},
    details::SubmissionDetails,
    files::UploadedFile,
    null_as_default, string_or_number,
};
use serde::{Deserialize, Serialize};

/// The four step drafts assembled together at review time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionDraft {
    pub details: SubmissionDetails,
    pub files: Vec<UploadedFile>,
    pub contributors: ContributorList,
    pub editor_notes: String,
    pub submission_id: Option<String>,
}

impl SubmissionDraft {
    /// Snapshot handed to the backend; `submitted_by` is filled by the gateway
    pub fn to_payload(&self) -> SubmissionPayload {
        SubmissionPayload {
            details: self.details.clone(),
            files: self.files.clone(),
            contributors: self.contributors.as_slice().to_vec(),
            editor_comments: self.editor_notes.clone(),
            submitted_by: None,
            submission_id: self.submission_id.clone(),
        }
    }
}

/// `make_submission.php` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    #[serde(flatten)]
    pub details: SubmissionDetails,
    pub files: Vec<UploadedFile>,
    pub contributors: Vec<Contributor>,
    #[serde(rename = "editorComments")]
    pub editor_comments: String,
    pub submitted_by: Option<String>,
    #[serde(rename = "submissionId", skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
}

/// One row of `get_submissions.php`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    #[serde(alias = "_id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(
        rename = "lastActivity",
        alias = "last_activity",
        alias = "updated_at",
        default
    )]
    pub last_activity: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileCategory;

    #[test]
    fn test_payload_flattens_details() {
        let mut contributors = ContributorList::new();
        contributors.add(Contributor::new("A", "a@x.com"));

        let draft = SubmissionDraft {
            details: SubmissionDetails::new("Soil Stabilization", "Lime and clay")
                .with_keywords("soil, lime"),
            files: vec![UploadedFile {
                name: "paper.docx".to_string(),
                size: 1024,
                category: FileCategory::Manuscript,
                server_file_name: "srv_paper.docx".to_string(),
            }],
            contributors,
            editor_notes: "Please consider for the special issue".to_string(),
            submission_id: Some("1744450000000".to_string()),
        };

        let mut payload = draft.to_payload();
        payload.submitted_by = Some("7".to_string());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["title"], "Soil Stabilization");
        assert_eq!(json["abstract"], "Lime and clay");
        assert_eq!(json["keywords"][1], "lime");
        assert_eq!(json["files"][0]["serverFileName"], "srv_paper.docx");
        assert_eq!(json["contributors"][0]["isPrimaryContact"], true);
        assert_eq!(json["editorComments"], "Please consider for the special issue");
        assert_eq!(json["submitted_by"], "7");
        assert_eq!(json["submissionId"], "1744450000000");
    }

    #[test]
    fn test_summary_accepts_mongo_style_id() {
        let summary: SubmissionSummary =
            serde_json::from_str(r#"{"_id": 19, "title": "Pushkar", "status": "Incomplete"}"#)
                .unwrap();
        assert_eq!(summary.id, "19");
        assert_eq!(summary.status, "Incomplete");
        assert!(summary.last_activity.is_none());
    }
}
