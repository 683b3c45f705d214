use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use super::animation::ScoreCounter;
use super::results_view::{render_results, Frame};
use super::score::ScoreRing;
use super::service::CoreService;

pub struct AppState {
    pub core: Arc<CoreService>,
}

/// Returns whether the analysis succeeded; failures are printed, not raised.
pub async fn analyze(
    state: &AppState,
    file: PathBuf,
    animate: bool,
    json: bool,
) -> anyhow::Result<bool> {
    let mut out = std::io::stdout();
    let result = match state.core.analyze_file(&file).await {
        Ok(result) => result,
        Err(err) => {
            writeln!(out, "✗ {err}")?;
            return Ok(false);
        }
    };

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
        return Ok(true);
    }

    if animate {
        let mut counter = ScoreCounter::default();
        let mut frames = counter.trigger(result.ats_score);
        writeln!(out, "Your ATS Analysis")?;
        while frames.changed().await.is_ok() {
            let value = *frames.borrow_and_update();
            write!(out, "\r   {}", ScoreRing::new(value).gauge(20))?;
            out.flush()?;
        }
        writeln!(out)?;
        writeln!(out)?;
    }

    writeln!(out, "{}", render_results(&result, Frame::settled(&result)))?;
    Ok(true)
}

pub async fn health(state: &AppState) -> anyhow::Result<bool> {
    let mut out = std::io::stdout();
    match state.core.health().await {
        Ok(health) => {
            writeln!(out, "{}", serde_json::to_string_pretty(&health)?)?;
            Ok(true)
        }
        Err(err) => {
            writeln!(out, "✗ {err}")?;
            Ok(false)
        }
    }
}

pub async fn show_settings(state: &AppState) -> anyhow::Result<()> {
    let settings = state.core.get_settings().await;
    let mut out = std::io::stdout();
    writeln!(out, "{}", serde_json::to_string_pretty(&settings)?)?;
    writeln!(out, "settings file: {}", state.core.settings_path().display())?;
    Ok(())
}

pub async fn set_api_url(state: &AppState, url: String) -> anyhow::Result<()> {
    let settings = state.core.save_api_base_url(&url).await?;
    writeln!(
        std::io::stdout(),
        "API base URL saved: {}",
        settings.api_base_url
    )?;
    Ok(())
}

/// Interactive session on stdin/stdout.
pub async fn interactive(state: &AppState) -> anyhow::Result<()> {
    let session = state.core.session();
    let input = session.input();

    // A dedicated thread keeps a blocked stdin read from holding up runtime shutdown.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if !input.send_line(line) {
                return;
            }
        }
        input.close();
    });

    let mut out = std::io::stdout();
    session.run(&mut out).await
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::core::settings_store::SettingsStore;

    async fn state_for(dir: &std::path::Path, base_url: String) -> AppState {
        let store = SettingsStore::new_with_path(dir.join("client-settings.json"));
        AppState {
            core: CoreService::with_store(store, Some(base_url)).await.unwrap(),
        }
    }

    #[tokio::test]
    async fn analyze_reports_failure_without_raising() {
        let temp = tempfile::tempdir().unwrap();
        let notes = temp.path().join("notes.txt");
        tokio::fs::write(&notes, b"hello").await.unwrap();

        let state = state_for(temp.path(), "http://127.0.0.1:9".to_string()).await;
        assert!(!analyze(&state, notes, false, false).await.unwrap());
    }

    #[tokio::test]
    async fn analyze_prints_json_on_success() {
        let temp = tempfile::tempdir().unwrap();
        let resume = temp.path().join("jane.pdf");
        tokio::fs::write(&resume, b"%PDF-1.4").await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
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
            let body = r#"{"ats_score": 55}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.flush().await.unwrap();
        });

        let state = state_for(temp.path(), base).await;
        assert!(analyze(&state, resume, false, true).await.unwrap());
    }
}
