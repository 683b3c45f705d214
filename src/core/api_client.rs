use std::time::{Duration, Instant};

use anyhow::Context;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use super::errors::CoreError;
use super::models::{AnalysisResult, ClientSettings, ErrorResponse, HealthStatus};

const ANALYZE_PATH: &str = "/api/analyze-resume";
const HEALTH_PATH: &str = "/health";
pub const RESUME_FIELD: &str = "resume";

/// Bytes of an accepted file, ready to be posted.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Remote side of the upload flow. Implemented by [`AnalyzerClient`] and by
/// in-process fakes in tests.
pub trait AnalysisBackend: Send + Sync {
    fn analyze(&self, upload: ResumeUpload) -> BoxFuture<'_, Result<AnalysisResult, CoreError>>;

    fn health(&self) -> BoxFuture<'_, Result<HealthStatus, CoreError>>;
}

#[derive(Clone)]
pub struct AnalyzerClient {
    client: Client,
    base_url: String,
    analyze_timeout: Duration,
    health_timeout: Duration,
}

impl AnalyzerClient {
    pub fn new(client: Client, settings: &ClientSettings) -> anyhow::Result<Self> {
        let parsed = Url::parse(settings.api_base_url.trim())
            .with_context(|| format!("invalid API base URL '{}'", settings.api_base_url))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            analyze_timeout: Duration::from_secs(settings.analyze_timeout_secs.max(1)),
            health_timeout: Duration::from_secs(settings.health_timeout_secs.max(1)),
        })
    }

    pub fn with_timeouts(mut self, analyze: Duration, health: Duration) -> Self {
        self.analyze_timeout = analyze;
        self.health_timeout = health;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn analyze_resume(&self, upload: ResumeUpload) -> Result<AnalysisResult, CoreError> {
        let url = format!("{}{ANALYZE_PATH}", self.base_url);
        let size = upload.bytes.len();

        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|err| CoreError::TransportError(err.to_string()))?;
        let form = Form::new().part(RESUME_FIELD, part);

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(self.analyze_timeout)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_send_error)?;
        info!(
            url = %url,
            file = %upload.file_name,
            bytes = size,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analyze request finished"
        );

        if !status.is_success() {
            let payload = serde_json::from_str::<ErrorResponse>(&body).unwrap_or_default();
            if let Some(details) = payload.details.as_deref() {
                debug!(details, "analysis service error details");
            }
            return Err(CoreError::server(Some(status.as_u16()), payload.error));
        }

        AnalysisResult::from_json(&body).map_err(|err| {
            warn!("analysis service returned an unusable body");
            err
        })
    }

    pub async fn check_health(&self) -> Result<HealthStatus, CoreError> {
        let url = format!("{}{HEALTH_PATH}", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|err| {
                debug!(url = %url, error = %err, "health probe failed");
                CoreError::ServiceUnavailable
            })?;

        if !response.status().is_success() {
            debug!(url = %url, status = response.status().as_u16(), "health probe rejected");
            return Err(CoreError::ServiceUnavailable);
        }

        response
            .json::<HealthStatus>()
            .await
            .map_err(|_| CoreError::ServiceUnavailable)
    }
}

impl AnalysisBackend for AnalyzerClient {
    fn analyze(&self, upload: ResumeUpload) -> BoxFuture<'_, Result<AnalysisResult, CoreError>> {
        self.analyze_resume(upload).boxed()
    }

    fn health(&self) -> BoxFuture<'_, Result<HealthStatus, CoreError>> {
        self.check_health().boxed()
    }
}

/// A request that never got built is a transport error; anything that failed
/// after dispatch means no usable response came back.
fn classify_send_error(err: reqwest::Error) -> CoreError {
    if err.is_builder() {
        return CoreError::TransportError(err.to_string());
    }

    warn!(error = %err, timeout = err.is_timeout(), "analyze request got no response");
    CoreError::NoResponse
}
