use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::api_client::{AnalysisBackend, AnalyzerClient};
use super::errors::CoreError;
use super::file_validator::{self, inspect_candidate};
use super::models::{AnalysisResult, ClientSettings, HealthStatus};
use super::session::Session;
use super::settings_store::{SettingsStore, API_BASE_URL_ENV};
use super::upload;

/// Wires settings, the HTTP client and the controllers together.
pub struct CoreService {
    settings_store: SettingsStore,
    settings: RwLock<ClientSettings>,
    analyzer: Arc<AnalyzerClient>,
}

impl CoreService {
    pub async fn new(api_url_override: Option<String>) -> anyhow::Result<Arc<Self>> {
        Self::with_store(SettingsStore::new(), api_url_override).await
    }

    pub async fn with_store(
        settings_store: SettingsStore,
        api_url_override: Option<String>,
    ) -> anyhow::Result<Arc<Self>> {
        let settings = settings_store
            .resolve(std::env::var(API_BASE_URL_ENV).ok(), api_url_override)
            .await;

        let client = reqwest::Client::builder()
            .user_agent("InterATSDesktop/1.0")
            .build()
            .context("failed to build HTTP client")?;
        let analyzer = Arc::new(AnalyzerClient::new(client, &settings)?);
        info!(api = analyzer.base_url(), "analysis service configured");

        Ok(Arc::new(Self {
            settings_store,
            settings: RwLock::new(settings),
            analyzer,
        }))
    }

    pub async fn get_settings(&self) -> ClientSettings {
        self.settings.read().await.clone()
    }

    pub fn settings_path(&self) -> &Path {
        self.settings_store.path()
    }

    /// Persists a new base URL. Takes effect on the next start.
    pub async fn save_api_base_url(&self, url: &str) -> anyhow::Result<ClientSettings> {
        let trimmed = url.trim();
        url::Url::parse(trimmed).with_context(|| format!("invalid API base URL '{trimmed}'"))?;

        let mut stored = self.settings_store.load().await.unwrap_or_default();
        stored.api_base_url = trimmed.to_string();
        self.settings_store.save(&stored).await?;

        let mut settings = self.settings.write().await;
        settings.api_base_url = stored.api_base_url.clone();
        Ok(settings.clone())
    }

    pub fn backend(&self) -> Arc<dyn AnalysisBackend> {
        self.analyzer.clone()
    }

    pub fn session(&self) -> Session {
        Session::new(self.backend())
    }

    /// One-shot upload for a single path. Rejected files never reach the
    /// network.
    pub async fn analyze_file(&self, path: &Path) -> Result<AnalysisResult, CoreError> {
        let file = inspect_candidate(path).await?;
        if let Err(err) = file_validator::validate(&file) {
            info!(file = %file.name, mime = %file.mime_type, size = file.size, "file rejected: {err}");
            return Err(err);
        }

        info!(file = %file.name, size = file.size, "submitting resume");
        let result = upload::submit(self.analyzer.as_ref(), &file).await;
        match &result {
            Ok(result) => info!(score = result.ats_score, "analysis finished"),
            Err(err) => warn!("analysis failed: {err}"),
        }
        result
    }

    pub async fn health(&self) -> Result<HealthStatus, CoreError> {
        self.analyzer.check_health().await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Answers one request with `status_line` and `body`, returning how many
    /// request bytes arrived.
    async fn answer_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<usize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 8192];
            loop {
                let read = stream.read(&mut buf).await.unwrap();
                if read == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..read]);

                let text = String::from_utf8_lossy(&received).to_string();
                let Some(header_end) = text.find("\r\n\r\n") else {
                    continue;
                };
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if received.len() >= header_end + 4 + content_length {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.flush().await.unwrap();
            received.len()
        });
        (format!("http://127.0.0.1:{port}"), handle)
    }

    async fn service_for(dir: &Path, base_url: &str) -> Arc<CoreService> {
        let store = SettingsStore::new_with_path(dir.join("client-settings.json"));
        CoreService::with_store(store, Some(base_url.to_string()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn analyze_file_uploads_and_parses() {
        let temp = tempfile::tempdir().unwrap();
        let resume = temp.path().join("jane.pdf");
        tokio::fs::write(&resume, vec![b'x'; 4096]).await.unwrap();

        let (base, server) = answer_once(
            "200 OK",
            r#"{"success": true, "ats_score": 72, "matched_skills": ["Python"]}"#,
        )
        .await;
        let core = service_for(temp.path(), &base).await;

        let result = core.analyze_file(&resume).await.unwrap();
        assert_eq!(result.ats_score, 72);
        assert_eq!(result.matched_skills, vec!["Python".to_string()]);
        assert!(server.await.unwrap() > 4096);
    }

    #[tokio::test]
    async fn analyze_file_surfaces_server_message() {
        let temp = tempfile::tempdir().unwrap();
        let resume = temp.path().join("jane.docx");
        tokio::fs::write(&resume, b"PK fake docx").await.unwrap();

        let (base, _server) = answer_once(
            "400 Bad Request",
            r#"{"error": "Could not extract text from resume"}"#,
        )
        .await;
        let core = service_for(temp.path(), &base).await;

        let err = core.analyze_file(&resume).await.unwrap_err();
        assert_eq!(err.to_string(), "Could not extract text from resume");
    }

    #[tokio::test]
    async fn analyze_file_rejects_before_connecting() {
        let temp = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let core = service_for(temp.path(), &base).await;

        let notes = temp.path().join("notes.txt");
        tokio::fs::write(&notes, b"hello").await.unwrap();
        let err = core.analyze_file(&notes).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidFileType { .. }));

        let big = temp.path().join("big.pdf");
        tokio::fs::write(&big, vec![0u8; 5 * 1024 * 1024 + 1]).await.unwrap();
        let err = core.analyze_file(&big).await.unwrap_err();
        assert!(matches!(err, CoreError::FileTooLarge { .. }));

        let err = core
            .analyze_file(&temp.path().join("missing.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::FileUnreadable(_)));

        let accepted = tokio::time::timeout(std::time::Duration::from_millis(100), listener.accept()).await;
        assert!(accepted.is_err(), "a rejected file reached the server");
    }
}
