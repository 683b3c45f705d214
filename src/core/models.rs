use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::errors::CoreError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Body of a successful `POST /api/analyze-resume`, as sent by the service.
///
/// Every field is optional on the wire; [`AnalysisResult::from_response`] is the
/// only place that decides what a missing value means.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub ats_score: Option<f64>,
    #[serde(default)]
    pub score_breakdown: Option<ScoreBreakdownResponse>,
    #[serde(default)]
    pub matched_skills: Option<Vec<String>>,
    #[serde(default)]
    pub missing_skills: Option<Vec<String>>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    pub sections_detected: Option<IndexMap<String, bool>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdownResponse {
    #[serde(default)]
    pub keyword_match: Option<f64>,
    #[serde(default)]
    pub section_completeness: Option<f64>,
    #[serde(default)]
    pub formatting: Option<f64>,
    #[serde(default)]
    pub content_quality: Option<f64>,
}

/// Error body sent with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub keyword_match: u8,
    pub section_completeness: u8,
    pub formatting: u8,
    pub content_quality: u8,
}

impl ScoreBreakdown {
    pub fn categories(&self) -> [(&'static str, u8); 4] {
        [
            ("Keyword Match", self.keyword_match),
            ("Section Completeness", self.section_completeness),
            ("Formatting", self.formatting),
            ("Content Quality", self.content_quality),
        ]
    }
}

/// Fully populated analysis, safe to hand to presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ats_score: u8,
    pub score_breakdown: ScoreBreakdown,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub suggestions: Vec<String>,
    pub sections_detected: IndexMap<String, bool>,
}

impl AnalysisResult {
    pub fn from_response(response: AnalysisResponse) -> Result<Self, CoreError> {
        let ats_score = response
            .ats_score
            .filter(|v| v.is_finite())
            .map(|v| clamp_percent(Some(v)))
            .ok_or_else(|| CoreError::server(None, None))?;

        let breakdown = response.score_breakdown.unwrap_or_default();

        Ok(Self {
            ats_score,
            score_breakdown: ScoreBreakdown {
                keyword_match: clamp_percent(breakdown.keyword_match),
                section_completeness: clamp_percent(breakdown.section_completeness),
                formatting: clamp_percent(breakdown.formatting),
                content_quality: clamp_percent(breakdown.content_quality),
            },
            matched_skills: response.matched_skills.unwrap_or_default(),
            missing_skills: response.missing_skills.unwrap_or_default(),
            suggestions: response.suggestions.unwrap_or_default(),
            sections_detected: response.sections_detected.unwrap_or_default(),
        })
    }

    pub fn from_json(body: &str) -> Result<Self, CoreError> {
        let response = serde_json::from_str::<AnalysisResponse>(body)
            .map_err(|_| CoreError::server(None, None))?;
        Self::from_response(response)
    }
}

fn clamp_percent(value: Option<f64>) -> u8 {
    match value {
        Some(v) if v.is_finite() => v.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// A file picked by the user, with the type the picker reports for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Success,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadState {
    pub file_name: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: UploadPhase,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub results: Option<AnalysisResult>,
}

impl ViewState {
    pub fn is_showing_results(&self) -> bool {
        self.results.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub analyze_timeout_secs: u64,
    pub health_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            analyze_timeout_secs: 30,
            health_timeout_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_zero_and_empty() {
        let result = AnalysisResult::from_json(r#"{"ats_score": 55}"#).unwrap();
        assert_eq!(result.ats_score, 55);
        assert_eq!(result.score_breakdown, ScoreBreakdown::default());
        assert!(result.matched_skills.is_empty());
        assert!(result.missing_skills.is_empty());
        assert!(result.suggestions.is_empty());
        assert!(result.sections_detected.is_empty());
    }

    #[test]
    fn null_fields_are_treated_as_missing() {
        let body = r#"{
            "ats_score": 61,
            "score_breakdown": {"keyword_match": null, "formatting": 70},
            "matched_skills": null,
            "suggestions": ["Add metrics"]
        }"#;
        let result = AnalysisResult::from_json(body).unwrap();
        assert_eq!(result.score_breakdown.keyword_match, 0);
        assert_eq!(result.score_breakdown.formatting, 70);
        assert_eq!(result.score_breakdown.content_quality, 0);
        assert!(result.matched_skills.is_empty());
        assert_eq!(result.suggestions, vec!["Add metrics".to_string()]);
    }

    #[test]
    fn fractional_and_out_of_range_scores_are_clamped() {
        let body = r#"{"ats_score": 100.4, "score_breakdown": {"keyword_match": 140, "formatting": -3, "content_quality": 66.6}}"#;
        let result = AnalysisResult::from_json(body).unwrap();
        assert_eq!(result.ats_score, 100);
        assert_eq!(result.score_breakdown.keyword_match, 100);
        assert_eq!(result.score_breakdown.formatting, 0);
        assert_eq!(result.score_breakdown.content_quality, 67);
    }

    #[test]
    fn missing_score_is_a_server_error() {
        let err = AnalysisResult::from_json(r#"{"matched_skills": ["Rust"]}"#).unwrap_err();
        assert_eq!(err.user_message(), "Failed to analyze resume");

        let err = AnalysisResult::from_json("<html>oops</html>").unwrap_err();
        assert!(matches!(err, CoreError::ServerError { .. }));
    }

    #[test]
    fn sections_keep_service_order() {
        let body = r#"{"ats_score": 10, "sections_detected": {"summary": true, "experience": false, "education": true}}"#;
        let result = AnalysisResult::from_json(body).unwrap();
        let names: Vec<&str> = result.sections_detected.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["summary", "experience", "education"]);
    }

    #[test]
    fn settings_fill_missing_fields_from_defaults() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"apiBaseUrl": "https://ats.example.com"}"#).unwrap();
        assert_eq!(settings.api_base_url, "https://ats.example.com");
        assert_eq!(settings.analyze_timeout_secs, 30);
        assert_eq!(settings.health_timeout_secs, 5);
    }
}
