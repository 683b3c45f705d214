use thiserror::Error;

pub const GENERIC_ANALYZE_FAILURE: &str = "Failed to analyze resume";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Please upload a PDF or DOCX file")]
    InvalidFileType { mime_type: String },
    #[error("File size must be less than 5MB")]
    FileTooLarge { size: u64 },
    #[error("{message}")]
    ServerError { status: Option<u16>, message: String },
    #[error("Server is not responding. Please try again later.")]
    NoResponse,
    #[error("Failed to upload resume. Please try again.")]
    TransportError(String),
    #[error("Failed to upload resume. Please try again.")]
    FileUnreadable(String),
    #[error("API is not available")]
    ServiceUnavailable,
}

impl CoreError {
    pub fn server(status: Option<u16>, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_ANALYZE_FAILURE.to_string());
        CoreError::ServerError { status, message }
    }

    /// Rejections raised before any request is built.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidFileType { .. }
                | CoreError::FileTooLarge { .. }
                | CoreError::FileUnreadable(_)
        )
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
