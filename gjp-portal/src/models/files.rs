//! Upload step: file references and upload candidates
//!
//! The client never keeps file bytes after an upload completes; only the
//! server-assigned filename, size and category are stored in the draft.

use gjp_common::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Largest accepted upload (50 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Manuscript extensions accepted by the journal
pub const ALLOWED_EXTENSIONS: &[&str] = &["doc", "docx"];

const MIME_DOC: &str = "application/msword";
const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const MIME_UNKNOWN: &str = "application/octet-stream";

/// What role a file plays in the submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileCategory {
    #[serde(rename = "Manuscript")]
    Manuscript,
    #[serde(rename = "Supplementary Material")]
    Supplementary,
}

impl FileCategory {
    /// Word documents are manuscripts; anything else is supplementary
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        if mime.contains("document") || mime == MIME_DOC {
            FileCategory::Manuscript
        } else {
            FileCategory::Supplementary
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileCategory::Manuscript => "Manuscript",
            FileCategory::Supplementary => "Supplementary Material",
        }
    }
}

/// A successfully uploaded file, as stored in the Files draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Client-visible name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    #[serde(rename = "type")]
    pub category: FileCategory,
    /// Filename assigned by the upload endpoint
    #[serde(rename = "serverFileName", default)]
    pub server_file_name: String,
}

impl UploadedFile {
    /// Size formatted the way the review page shows it (`12.34 KB`)
    pub fn display_size(&self) -> String {
        format!("{:.2} KB", self.size as f64 / 1024.0)
    }
}

/// A local file about to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub mime_type: String,
}

impl UploadCandidate {
    /// Stat the file and sniff its MIME type
    ///
    /// MIME detection reads the magic bytes; when they are inconclusive the
    /// extension decides.
    pub fn inspect(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let sniffed = infer::get_from_path(path)?.map(|t| t.mime_type().to_string());
        let mime_type = sniffed.unwrap_or_else(|| mime_from_extension(&file_name).to_string());

        debug!(
            file = %file_name,
            size = metadata.len(),
            mime = %mime_type,
            "Inspected upload candidate"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            size: metadata.len(),
            mime_type,
        })
    }

    /// Lower-cased extension, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    pub fn category(&self) -> FileCategory {
        FileCategory::from_mime(&self.mime_type)
    }

    /// Build the draft record once the server has assigned a filename
    pub fn into_uploaded(self, server_file_name: String) -> UploadedFile {
        let category = self.category();
        UploadedFile {
            name: self.file_name,
            size: self.size,
            category,
            server_file_name,
        }
    }
}

fn mime_from_extension(file_name: &str) -> &'static str {
    match Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .as_deref()
    {
        Some("doc") => MIME_DOC,
        Some("docx") => MIME_DOCX,
        _ => MIME_UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_category_from_mime() {
        assert_eq!(FileCategory::from_mime(MIME_DOCX), FileCategory::Manuscript);
        assert_eq!(FileCategory::from_mime(MIME_DOC), FileCategory::Manuscript);
        assert_eq!(
            FileCategory::from_mime("application/vnd.ms-excel"),
            FileCategory::Supplementary
        );
        assert_eq!(FileCategory::from_mime(""), FileCategory::Supplementary);
    }

    #[test]
    fn test_uploaded_file_wire_format() {
        let file = UploadedFile {
            name: "paper.docx".to_string(),
            size: 2048,
            category: FileCategory::Supplementary,
            server_file_name: "u7_169000_paper.docx".to_string(),
        };
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["type"], "Supplementary Material");
        assert_eq!(json["serverFileName"], "u7_169000_paper.docx");
        assert_eq!(file.display_size(), "2.00 KB");
    }

    #[test]
    fn test_inspect_falls_back_to_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Manuscript.DOCX");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"plain text, not a real zip container").unwrap();

        let candidate = UploadCandidate::inspect(&path).unwrap();

        assert_eq!(candidate.file_name, "Manuscript.DOCX");
        assert_eq!(candidate.extension().as_deref(), Some("docx"));
        assert_eq!(candidate.mime_type, MIME_DOCX);
        assert_eq!(candidate.category(), FileCategory::Manuscript);
        assert_eq!(candidate.size, 36);
    }

    #[test]
    fn test_inspect_missing_file_is_io_error() {
        let result = UploadCandidate::inspect(Path::new("/definitely/not/here.docx"));
        assert!(matches!(result, Err(gjp_common::Error::Io(_))));
    }
}
