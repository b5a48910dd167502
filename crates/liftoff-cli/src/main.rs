//! Liftoff - install, update and launch apps from a descriptor file
//!
//! Usage:
//!   liftoff App.liftoff                  # Run the app described by the file
//!   liftoff App.liftoff --yes            # Accept every prompt
//!   liftoff App.liftoff --gallery-dir D  # Keep apps under D
//!   liftoff --save-settings --gallery-dir D  # Make D the default

mod terminal_ui;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liftoff_core::descriptor::AppDescriptor;
use liftoff_core::error::LaunchError;
use liftoff_core::net::HttpRetriever;
use liftoff_core::run::RunOrchestrator;
use liftoff_core::session::run_with_event_loop;
use liftoff_core::settings::{Settings, SettingsStore};
use liftoff_core::shortcut::DesktopShortcutCreator;
use liftoff_core::ui::UserInterface;

use crate::terminal_ui::TerminalUserInterface;

const EXIT_FAILURE: u8 = 1;
const EXIT_CANCELED: u8 = 2;

#[derive(Parser)]
#[command(name = "liftoff")]
#[command(about = "Network app launcher and updater", long_about = None)]
#[command(version)]
struct Cli {
    /// Descriptor file of the app to run
    #[arg(required_unless_present = "save_settings")]
    descriptor: Option<PathBuf>,

    /// Directory holding installed apps (overrides the settings file)
    #[arg(long, value_name = "DIR")]
    gallery_dir: Option<PathBuf>,

    /// Do not echo the app's output after it exits
    #[arg(long)]
    skip_app_output: bool,

    /// Answer yes to every prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Logging level: trace, debug, info, warning or error
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Write the resulting settings to the settings file
    #[arg(long)]
    save_settings: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match SettingsStore::from_default_location()
        .and_then(|store| load_settings(&cli, &store))
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(descriptor) = cli.descriptor.clone() else {
        return ExitCode::SUCCESS;
    };

    let ui = Arc::new(TerminalUserInterface::new(cli.yes));

    match run(&descriptor, settings, ui.clone()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if LaunchError::is_canceled(&e) => {
            tracing::info!("Run canceled");
            ExitCode::from(EXIT_CANCELED)
        }
        Err(e) => {
            tracing::debug!("Run failed: {:?}", e);
            ui.show_error(&format!("{:#}", e));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Settings file merged with command-line overrides, saved back on request.
fn load_settings(cli: &Cli, store: &SettingsStore) -> Result<Settings> {
    let mut settings = store.load()?;

    if let Some(dir) = &cli.gallery_dir {
        settings.gallery_dir = dir.clone();
    }
    if cli.skip_app_output {
        settings.skip_app_output = true;
    }
    if let Some(level) = &cli.log_level {
        settings.logging_level = level.clone();
    }

    settings
        .validate()
        .context("Invalid command-line settings")?;

    if cli.save_settings {
        store.save(&settings)?;
        eprintln!("Settings saved to {}", store.path().display());
    }
    Ok(settings)
}

fn run(descriptor: &Path, settings: Settings, ui: Arc<TerminalUserInterface>) -> Result<()> {
    let retriever = Arc::new(HttpRetriever::new()?);
    let mut orchestrator = RunOrchestrator::new(settings, retriever);

    match DesktopShortcutCreator::for_current_user() {
        Ok(creator) => orchestrator = orchestrator.with_shortcut_creator(Arc::new(creator)),
        Err(e) => tracing::debug!("Desktop shortcuts unavailable: {:#}", e),
    }

    let boot = AppDescriptor::from_path(descriptor, orchestrator.context())?;
    tracing::debug!(
        "Boot descriptor {} for {}",
        descriptor.display(),
        boot.title()
    );

    ui.show();
    let worker_ui = ui.clone();
    run_with_event_loop(
        move || orchestrator.run(boot, worker_ui.as_ref()),
        |handle| handle.wait(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "liftoff",
            "App.liftoff",
            "--gallery-dir",
            "/tmp/apps",
            "--skip-app-output",
            "-y",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.descriptor, Some(PathBuf::from("App.liftoff")));
        assert_eq!(cli.gallery_dir, Some(PathBuf::from("/tmp/apps")));
        assert!(cli.skip_app_output);
        assert!(cli.yes);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn descriptor_is_required_unless_saving() {
        assert!(Cli::try_parse_from(["liftoff"]).is_err());

        let cli = Cli::try_parse_from(["liftoff", "--save-settings"]).unwrap();
        assert!(cli.save_settings);
        assert_eq!(cli.descriptor, None);
    }

    #[test]
    fn overrides_are_saved_on_request() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::from_path(temp.path().join("liftoff").join("liftoff.toml"));
        let cli = Cli::try_parse_from([
            "liftoff",
            "--save-settings",
            "--gallery-dir",
            "/srv/apps",
            "--log-level",
            "warning",
        ])
        .unwrap();

        let settings = load_settings(&cli, &store).unwrap();

        assert_eq!(store.load().unwrap(), settings);
        assert_eq!(settings.gallery_dir, PathBuf::from("/srv/apps"));
        assert_eq!(settings.log_directive(), "warn");
    }

    #[test]
    fn overrides_are_not_saved_by_default() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::from_path(temp.path().join("liftoff.toml"));
        let cli = Cli::try_parse_from(["liftoff", "App.liftoff", "--skip-app-output"]).unwrap();

        let settings = load_settings(&cli, &store).unwrap();

        assert!(settings.skip_app_output);
        assert!(!store.path().exists());
    }
}
