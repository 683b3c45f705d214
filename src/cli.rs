use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::core::commands::{self, AppState};
use crate::core::service::CoreService;

#[derive(Debug, Parser)]
#[command(name = "interats-desktop")]
#[command(about = "Check how ATS-friendly a resume is using the InterATS analysis service.", long_about = None)]
pub struct Cli {
    /// Analysis service base URL (overrides API_BASE_URL and saved settings)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log request details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload one resume and print the analysis
    Analyze {
        /// PDF or DOCX file, at most 5MB
        file: PathBuf,

        /// Skip the score count-up
        #[arg(long)]
        no_animate: bool,

        /// Print the parsed analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Probe the analysis service
    Health,
    /// Inspect or change saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    Show,
    SetApiUrl { url: String },
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    let state = AppState {
        core: CoreService::new(cli.api_url).await?,
    };

    let ok = match cli.cmd {
        None => {
            commands::interactive(&state).await?;
            true
        }
        Some(Command::Analyze {
            file,
            no_animate,
            json,
        }) => commands::analyze(&state, file, !no_animate, json).await?,
        Some(Command::Health) => commands::health(&state).await?,
        Some(Command::Settings {
            action: SettingsAction::Show,
        }) => {
            commands::show_settings(&state).await?;
            true
        }
        Some(Command::Settings {
            action: SettingsAction::SetApiUrl { url },
        }) => {
            commands::set_api_url(&state, url).await?;
            true
        }
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analyze_with_flags() {
        let cli = Cli::parse_from([
            "interats-desktop",
            "--api-url",
            "http://ats:8000",
            "analyze",
            "cv.pdf",
            "--no-animate",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://ats:8000"));
        match cli.cmd {
            Some(Command::Analyze {
                file,
                no_animate,
                json,
            }) => {
                assert_eq!(file, PathBuf::from("cv.pdf"));
                assert!(no_animate);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::parse_from(["interats-desktop", "-v"]);
        assert!(cli.verbose);
        assert!(cli.cmd.is_none());
    }

    #[test]
    fn settings_set_api_url_parses() {
        let cli = Cli::parse_from(["interats-desktop", "settings", "set-api-url", "https://x.io"]);
        assert!(matches!(
            cli.cmd,
            Some(Command::Settings {
                action: SettingsAction::SetApiUrl { .. }
            })
        ));
    }
}
