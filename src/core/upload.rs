use std::fmt::Write as _;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::api_client::{AnalysisBackend, ResumeUpload};
use super::errors::CoreError;
use super::file_validator;
use super::models::{AnalysisResult, CandidateFile, UploadPhase, UploadState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionTicket(Uuid);

impl SubmissionTicket {
    fn issue() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubmissionTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: SubmissionTicket,
    pub file: CandidateFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// A submission is already in flight; the pick was dropped.
    Ignored,
    Rejected(CoreError),
    Accepted(Submission),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Succeeded(AnalysisResult),
    Failed(CoreError),
    /// The ticket no longer matches the in-flight submission.
    Stale,
}

#[derive(Debug, Default)]
pub struct UploadController {
    state: UploadState,
    in_flight: Option<SubmissionTicket>,
}

impl UploadController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn in_flight(&self) -> Option<SubmissionTicket> {
        self.in_flight
    }

    pub fn intake(&mut self, file: CandidateFile) -> IntakeOutcome {
        if self.state.loading {
            debug!(file = %file.name, "ignoring file pick while a submission is in flight");
            return IntakeOutcome::Ignored;
        }

        self.state.error = None;
        self.state.file_name = None;
        self.state.phase = UploadPhase::Validating;

        if let Err(err) = file_validator::validate(&file) {
            info!(file = %file.name, mime = %file.mime_type, size = file.size, "file rejected: {err}");
            return self.reject(err);
        }

        let ticket = SubmissionTicket::issue();
        self.state.file_name = Some(file.name.clone());
        self.state.loading = true;
        self.state.phase = UploadPhase::Submitting;
        self.in_flight = Some(ticket);
        info!(%ticket, file = %file.name, size = file.size, "submitting resume");

        IntakeOutcome::Accepted(Submission { ticket, file })
    }

    /// Records a pick that could not even be inspected.
    pub fn intake_failed(&mut self, err: CoreError) -> IntakeOutcome {
        if self.state.loading {
            return IntakeOutcome::Ignored;
        }
        self.state.file_name = None;
        self.reject(err)
    }

    pub fn complete(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<AnalysisResult, CoreError>,
    ) -> Completion {
        if self.in_flight != Some(ticket) {
            debug!(%ticket, "discarding stale analysis response");
            return Completion::Stale;
        }

        self.in_flight = None;
        self.state.loading = false;

        match outcome {
            Ok(result) => {
                info!(%ticket, score = result.ats_score, "analysis finished");
                self.state.phase = UploadPhase::Success;
                Completion::Succeeded(result)
            }
            Err(err) => {
                warn!(%ticket, "analysis failed: {err}");
                self.state.error = Some(err.user_message());
                self.state.phase = UploadPhase::Failed;
                Completion::Failed(err)
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = UploadState::default();
        self.in_flight = None;
    }

    pub fn render_panel(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Upload Your Resume");
        let _ = writeln!(out, "Support for PDF and DOCX files • Maximum 5MB");
        let _ = writeln!(out);

        if self.state.loading {
            let _ = writeln!(out, "  Analyzing your resume...");
            let _ = writeln!(out, "  This may take a few seconds");
        } else {
            let prompt = self
                .state
                .file_name
                .as_deref()
                .unwrap_or("Drop your resume here, or click to browse");
            let _ = writeln!(out, "  {prompt}");
            let _ = writeln!(out, "  PDF or DOCX up to 5MB");
        }

        if let Some(error) = self.state.error.as_deref() {
            let _ = writeln!(out);
            let _ = writeln!(out, "  ✗ {error}");
        }

        out
    }

    fn reject(&mut self, err: CoreError) -> IntakeOutcome {
        self.state.error = Some(err.user_message());
        self.state.loading = false;
        self.state.phase = UploadPhase::Idle;
        IntakeOutcome::Rejected(err)
    }
}

/// Reads the accepted file and posts it. Runs off the controller so the
/// caller can keep handling input while the request is pending.
pub async fn submit(
    backend: &dyn AnalysisBackend,
    file: &CandidateFile,
) -> Result<AnalysisResult, CoreError> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|err| CoreError::FileUnreadable(format!("{}: {err}", file.path.display())))?;

    backend
        .analyze(ResumeUpload {
            file_name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            bytes,
        })
        .await
}
