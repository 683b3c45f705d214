use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::animation::{ScoreAnimator, ScoreCounter};
use super::api_client::AnalysisBackend;
use super::errors::CoreError;
use super::file_validator::inspect_candidate;
use super::models::{AnalysisResult, HealthStatus, ViewState};
use super::results_view::{render_results, Frame};
use super::score::ScoreRing;
use super::upload::{self, Completion, IntakeOutcome, SubmissionTicket, UploadController};

const GAUGE_WIDTH: usize = 20;

pub const HELP: &str = "Type a path to a .pdf or .docx file to analyze it.\n\
Commands: reset (analyze another resume), health (probe the API), help, quit";

/// Top-level view state: upload flow when empty, results flow otherwise.
#[derive(Debug, Default)]
pub struct RootController {
    view: ViewState,
}

impl RootController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn results(&self) -> Option<&AnalysisResult> {
        self.view.results.as_ref()
    }

    pub fn show_results(&mut self, result: AnalysisResult) {
        self.view.results = Some(result);
    }

    pub fn reset(&mut self) {
        self.view.results = None;
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    Input(String),
    InputClosed,
    AnalysisFinished {
        ticket: SubmissionTicket,
        outcome: Result<AnalysisResult, CoreError>,
    },
    HealthChecked(Result<HealthStatus, CoreError>),
}

#[derive(Debug, PartialEq)]
pub enum SessionUpdate {
    Nothing,
    Redraw,
    Busy,
    ShowingResults(u8),
    Stale,
    Health(Result<HealthStatus, CoreError>),
    Help,
    Quit,
}

#[derive(Debug, PartialEq)]
enum Command {
    Pick(PathBuf),
    Reset,
    Health,
    Help,
    Quit,
    Nothing,
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" => Command::Nothing,
        "reset" | "r" => Command::Reset,
        "health" => Command::Health,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => {
            // Terminals quote dropped paths that contain spaces.
            let unquoted = trimmed
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| {
                    trimmed
                        .strip_prefix('"')
                        .and_then(|v| v.strip_suffix('"'))
                })
                .unwrap_or(trimmed);
            Command::Pick(PathBuf::from(unquoted.replace("\\ ", " ")))
        }
    }
}

/// Handle used by input sources to feed a running [`Session`].
#[derive(Clone)]
pub struct SessionInput {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionInput {
    pub fn send_line(&self, line: impl Into<String>) -> bool {
        self.tx.send(SessionEvent::Input(line.into())).is_ok()
    }

    pub fn close(&self) {
        let _ = self.tx.send(SessionEvent::InputClosed);
    }
}

/// Single-owner event loop tying the upload flow to the results flow.
pub struct Session {
    backend: Arc<dyn AnalysisBackend>,
    root: RootController,
    upload: UploadController,
    counter: ScoreCounter,
    frames: Option<watch::Receiver<u8>>,
    /// Request left running by a reset; new picks wait for it to land.
    abandoned: Option<SubmissionTicket>,
    pending_health: usize,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    input_closed: bool,
}

impl Session {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        Self::with_animator(backend, ScoreAnimator::default())
    }

    pub fn with_animator(backend: Arc<dyn AnalysisBackend>, animator: ScoreAnimator) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            root: RootController::new(),
            upload: UploadController::new(),
            counter: ScoreCounter::new(animator),
            frames: None,
            abandoned: None,
            pending_health: 0,
            events_tx,
            events_rx,
            input_closed: false,
        }
    }

    pub fn input(&self) -> SessionInput {
        SessionInput {
            tx: self.events_tx.clone(),
        }
    }

    pub fn root(&self) -> &RootController {
        &self.root
    }

    pub fn upload(&self) -> &UploadController {
        &self.upload
    }

    pub fn is_animating(&self) -> bool {
        self.frames.is_some()
    }

    /// Whether an analyze request is still out, including one abandoned by a
    /// reset.
    pub fn is_request_pending(&self) -> bool {
        self.upload.is_loading() || self.abandoned.is_some()
    }

    /// Intake for a picked path. Picking from the results view starts over.
    pub async fn pick(&mut self, path: PathBuf) -> IntakeOutcome {
        if self.is_request_pending() {
            debug!(path = %path.display(), "ignoring pick while a request is pending");
            return IntakeOutcome::Ignored;
        }
        if self.root.view().is_showing_results() {
            self.reset();
        }

        let file = match inspect_candidate(path).await {
            Ok(file) => file,
            Err(err) => return self.upload.intake_failed(err),
        };

        let outcome = self.upload.intake(file);
        if let IntakeOutcome::Accepted(submission) = &outcome {
            let backend = Arc::clone(&self.backend);
            let tx = self.events_tx.clone();
            let ticket = submission.ticket;
            let file = submission.file.clone();
            tokio::spawn(async move {
                let outcome = upload::submit(backend.as_ref(), &file).await;
                let _ = tx.send(SessionEvent::AnalysisFinished { ticket, outcome });
            });
        }
        outcome
    }

    pub fn finish(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<AnalysisResult, CoreError>,
    ) -> Completion {
        if self.abandoned == Some(ticket) {
            self.abandoned = None;
        }
        let completion = self.upload.complete(ticket, outcome);
        if let Completion::Succeeded(result) = &completion {
            self.root.show_results(result.clone());
            self.frames = Some(self.counter.trigger(result.ats_score));
        }
        completion
    }

    /// Back to an empty upload view. A request still in flight is not
    /// cancelled; its response is discarded when it arrives.
    pub fn reset(&mut self) {
        if let Some(ticket) = self.upload.in_flight() {
            self.abandoned = Some(ticket);
        }
        self.counter.cancel();
        self.frames = None;
        self.root.reset();
        self.upload.reset();
    }

    pub fn frame(&self) -> Frame {
        let displayed_score = self.counter.displayed();
        Frame {
            displayed_score,
            revealed: displayed_score > 0 || !self.counter.is_running(),
        }
    }

    pub fn render(&self) -> String {
        match self.root.results() {
            Some(result) => render_results(result, self.frame()),
            None => self.upload.render_panel(),
        }
    }

    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    pub async fn handle_event(&mut self, event: SessionEvent) -> SessionUpdate {
        match event {
            SessionEvent::Input(line) => match parse_command(&line) {
                Command::Nothing => SessionUpdate::Nothing,
                Command::Help => SessionUpdate::Help,
                Command::Quit => SessionUpdate::Quit,
                Command::Reset => {
                    self.reset();
                    SessionUpdate::Redraw
                }
                Command::Health => {
                    let backend = Arc::clone(&self.backend);
                    let tx = self.events_tx.clone();
                    self.pending_health += 1;
                    tokio::spawn(async move {
                        let result = backend.health().await;
                        let _ = tx.send(SessionEvent::HealthChecked(result));
                    });
                    SessionUpdate::Nothing
                }
                Command::Pick(path) => match self.pick(path).await {
                    IntakeOutcome::Ignored => SessionUpdate::Busy,
                    _ => SessionUpdate::Redraw,
                },
            },
            SessionEvent::InputClosed => {
                self.input_closed = true;
                SessionUpdate::Nothing
            }
            SessionEvent::AnalysisFinished { ticket, outcome } => {
                match self.finish(ticket, outcome) {
                    Completion::Succeeded(result) => SessionUpdate::ShowingResults(result.ats_score),
                    Completion::Failed(_) => SessionUpdate::Redraw,
                    Completion::Stale => SessionUpdate::Stale,
                }
            }
            SessionEvent::HealthChecked(result) => {
                self.pending_health = self.pending_health.saturating_sub(1);
                SessionUpdate::Health(result)
            }
        }
    }

    /// Drives the session until `quit`, or until input is closed and no
    /// upload, health probe or animation is outstanding. Animation frames
    /// redraw the score gauge in place.
    pub async fn run<W: Write>(mut self, out: &mut W) -> anyhow::Result<()> {
        writeln!(out, "{}", self.render())?;
        writeln!(out, "{HELP}")?;

        loop {
            if self.input_closed
                && !self.is_request_pending()
                && self.pending_health == 0
                && self.frames.is_none()
            {
                break;
            }

            tokio::select! {
                event = self.events_rx.recv() => {
                    let Some(event) = event else { break };
                    match self.handle_event(event).await {
                        SessionUpdate::Nothing | SessionUpdate::Stale => {}
                        SessionUpdate::Quit => break,
                        SessionUpdate::Help => writeln!(out, "{HELP}")?,
                        SessionUpdate::Busy => {
                            writeln!(out, "An analysis is already running; wait for it to finish.")?
                        }
                        SessionUpdate::Redraw => writeln!(out, "{}", self.render())?,
                        SessionUpdate::ShowingResults(score) => {
                            writeln!(out, "Your ATS Analysis")?;
                            write!(out, "   {}", ScoreRing::new(0).gauge(GAUGE_WIDTH))?;
                            out.flush()?;
                            debug!(score, "animating score");
                        }
                        SessionUpdate::Health(Ok(health)) => writeln!(
                            out,
                            "API status: {} ({} {})",
                            health.status,
                            health.service.as_deref().unwrap_or("unknown service"),
                            health.version.as_deref().unwrap_or("")
                        )?,
                        SessionUpdate::Health(Err(err)) => writeln!(out, "✗ {err}")?,
                    }
                }
                frame = next_frame(&mut self.frames) => {
                    match frame {
                        Some(value) => {
                            write!(out, "\r   {}", ScoreRing::new(value).gauge(GAUGE_WIDTH))?;
                            out.flush()?;
                        }
                        None => {
                            self.frames = None;
                            writeln!(out)?;
                            writeln!(out, "{}", self.render())?;
                        }
                    }
                }
            }
        }

        self.counter.cancel();
        Ok(())
    }
}

async fn next_frame(frames: &mut Option<watch::Receiver<u8>>) -> Option<u8> {
    match frames {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(*rx.borrow_and_update()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_paths() {
        assert_eq!(parse_command("  "), Command::Nothing);
        assert_eq!(parse_command("RESET"), Command::Reset);
        assert_eq!(parse_command("quit"), Command::Quit);
        assert_eq!(parse_command("health"), Command::Health);
        assert_eq!(
            parse_command("/tmp/cv.pdf"),
            Command::Pick(PathBuf::from("/tmp/cv.pdf"))
        );
        assert_eq!(
            parse_command("'/tmp/my cv.pdf'"),
            Command::Pick(PathBuf::from("/tmp/my cv.pdf"))
        );
        assert_eq!(
            parse_command("\"/tmp/my cv.docx\""),
            Command::Pick(PathBuf::from("/tmp/my cv.docx"))
        );
        assert_eq!(
            parse_command("/tmp/my\\ cv.pdf"),
            Command::Pick(PathBuf::from("/tmp/my cv.pdf"))
        );
    }

    #[test]
    fn root_reset_returns_to_upload_flow() {
        let mut root = RootController::new();
        root.show_results(AnalysisResult::from_json(r#"{"ats_score": 50}"#).unwrap());
        assert!(root.view().is_showing_results());
        root.reset();
        assert!(!root.view().is_showing_results());
        assert!(root.results().is_none());
    }
}
