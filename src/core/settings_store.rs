use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

use super::models::ClientSettings;

pub const API_BASE_URL_ENV: &str = "API_BASE_URL";

pub struct SettingsStore {
    file_path: PathBuf,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::new_with_path(settings_path())
    }

    pub fn new_with_path(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }

    /// Stored settings, or defaults when nothing has been saved yet.
    pub async fn load(&self) -> anyhow::Result<ClientSettings> {
        let content = match tokio::fs::read_to_string(&self.file_path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ClientSettings::default()),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read settings file {}", self.file_path.display())
                })
            }
        };

        serde_json::from_str::<ClientSettings>(&content).with_context(|| {
            format!("invalid JSON in settings file {}", self.file_path.display())
        })
    }

    /// Effective settings for this run: the stored file, then `API_BASE_URL`,
    /// then an explicit override. Blank values are skipped at every layer and
    /// an unreadable file falls back to defaults.
    pub async fn resolve(
        &self,
        env_url: Option<String>,
        flag_url: Option<String>,
    ) -> ClientSettings {
        let stored = self.load().await.unwrap_or_else(|err| {
            warn!("ignoring unreadable settings file: {err:#}");
            ClientSettings::default()
        });
        layer(stored, env_url, flag_url)
    }

    pub async fn save(&self, settings: &ClientSettings) -> anyhow::Result<()> {
        if let Some(parent) = self.file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.file_path, json)
            .await
            .with_context(|| format!("failed to write settings file {}", self.file_path.display()))
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

fn layer(
    stored: ClientSettings,
    env_url: Option<String>,
    flag_url: Option<String>,
) -> ClientSettings {
    let non_blank = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let mut settings = stored;
    if settings.api_base_url.trim().is_empty() {
        settings.api_base_url = ClientSettings::default().api_base_url;
    }
    if let Some(url) = non_blank(env_url) {
        settings.api_base_url = url;
    }
    if let Some(url) = non_blank(flag_url) {
        settings.api_base_url = url;
    }
    settings
}

/// `client-settings.json` under the platform's local data dir, `InterATS/`.
fn settings_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("InterATS")
        .join("client-settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let store = SettingsStore::new_with_path(temp.path().join("nested").join("s.json"));
        assert_eq!(store.load().await.unwrap(), ClientSettings::default());
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let store = SettingsStore::new_with_path(temp.path().join("nested").join("s.json"));
        let settings = ClientSettings {
            api_base_url: "https://ats.example.com".to_string(),
            ..ClientSettings::default()
        };

        store.save(&settings).await.unwrap();
        assert_eq!(store.load().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("s.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let err = SettingsStore::new_with_path(path).load().await.unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[tokio::test]
    async fn flag_beats_env_beats_file() {
        let temp = tempfile::tempdir().unwrap();
        let store = SettingsStore::new_with_path(temp.path().join("s.json"));
        store
            .save(&ClientSettings {
                api_base_url: "http://file:1".to_string(),
                ..ClientSettings::default()
            })
            .await
            .unwrap();

        assert_eq!(store.resolve(None, None).await.api_base_url, "http://file:1");

        let resolved = store.resolve(Some("http://env:2".to_string()), None).await;
        assert_eq!(resolved.api_base_url, "http://env:2");

        let resolved = store
            .resolve(
                Some("http://env:2".to_string()),
                Some(" http://flag:3 ".to_string()),
            )
            .await;
        assert_eq!(resolved.api_base_url, "http://flag:3");
    }

    #[test]
    fn blank_values_fall_back_to_default() {
        let stored = ClientSettings {
            api_base_url: "  ".to_string(),
            ..ClientSettings::default()
        };
        let layered = layer(stored, Some(String::new()), Some("   ".to_string()));
        assert_eq!(layered.api_base_url, "http://localhost:5000");
    }

    #[tokio::test]
    async fn corrupt_file_resolves_to_defaults_with_override() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("s.json");
        tokio::fs::write(&path, "[]").await.unwrap();

        let store = SettingsStore::new_with_path(path);
        let resolved = store.resolve(None, Some("http://flag:3".to_string())).await;
        assert_eq!(resolved.api_base_url, "http://flag:3");
        assert_eq!(resolved.analyze_timeout_secs, 30);
    }
}
