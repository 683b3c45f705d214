use std::path::{Path, PathBuf};

use super::errors::CoreError;
use super::models::CandidateFile;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const FALLBACK_MIME: &str = "application/octet-stream";

pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Accepts a candidate only on its reported type and size. The file content is
/// never inspected here; the service validates the document itself.
pub fn validate(file: &CandidateFile) -> Result<(), CoreError> {
    if file.mime_type != PDF_MIME && file.mime_type != DOCX_MIME {
        return Err(CoreError::InvalidFileType {
            mime_type: file.mime_type.clone(),
        });
    }

    if file.size > MAX_UPLOAD_BYTES {
        return Err(CoreError::FileTooLarge { size: file.size });
    }

    Ok(())
}

/// The type a file picker would report for `path`, keyed on its extension.
pub fn reported_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|v| v.to_str())
        .map(|v| v.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => PDF_MIME,
        "docx" => DOCX_MIME,
        _ => FALLBACK_MIME,
    }
}

pub async fn inspect_candidate(path: impl Into<PathBuf>) -> Result<CandidateFile, CoreError> {
    let path = path.into();
    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|err| CoreError::FileUnreadable(format!("{}: {err}", path.display())))?;

    if !metadata.is_file() {
        return Err(CoreError::FileUnreadable(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let name = path
        .file_name()
        .and_then(|v| v.to_str())
        .unwrap_or("resume")
        .to_string();

    Ok(CandidateFile {
        mime_type: reported_mime_type(&path).to_string(),
        name,
        size: metadata.len(),
        path,
    })
}
