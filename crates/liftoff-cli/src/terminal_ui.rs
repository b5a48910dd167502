//! Prompt-based terminal front-end.
//!
//! Status lines go to stderr so the launched app owns stdout. Confirmations
//! use dialoguer and fall back to "no" when the terminal cannot prompt.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};

use liftoff_core::descriptor::AppDescriptor;
use liftoff_core::ui::{
    UserInterface, format_desktop_shortcut_prompt, format_secure_first_run_prompt,
    format_untrusted_first_run_prompt,
};

pub struct TerminalUserInterface {
    /// Answer every confirmation with "yes"
    assume_yes: bool,
    state: Mutex<ProgressState>,
}

#[derive(Default)]
struct ProgressState {
    hidden: bool,
    /// Last whole percentage drawn, to avoid redrawing on every chunk
    percent: Option<u32>,
}

impl TerminalUserInterface {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            state: Mutex::new(ProgressState::default()),
        }
    }

    fn confirm(&self, prompt: &str, default: bool) -> bool {
        if self.assume_yes {
            return true;
        }
        self.end_progress_line();

        match Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(default)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Cannot prompt on this terminal: {}", e);
                false
            }
        }
    }

    fn line(&self, text: impl std::fmt::Display) {
        let hidden = self.lock_state().hidden;
        if !hidden {
            self.end_progress_line();
            eprintln!("{}", text);
        }
    }

    fn end_progress_line(&self) {
        let mut state = self.lock_state();
        if state.percent.take().is_some() {
            eprintln!();
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UserInterface for TerminalUserInterface {
    fn show_error(&self, message: &str) {
        self.end_progress_line();
        eprintln!("{} {}", style("error:").red().bold(), message);
    }

    fn ask_for_secure_first_run(&self, descriptor: &AppDescriptor) -> bool {
        self.confirm(&format_secure_first_run_prompt(descriptor), true)
    }

    fn ask_for_untrusted_first_run(&self, descriptor: &AppDescriptor) -> bool {
        let prompt = format_untrusted_first_run_prompt(descriptor);
        self.confirm(&style(prompt).yellow().to_string(), false)
    }

    fn set_app(&self, title: &str) {
        self.line(style(title).bold().cyan());
    }

    fn set_header(&self, header: &str) {
        self.line(format!("  {}", style(header).bold()));
    }

    fn set_status(&self, status: &str) {
        self.line(format!("  {}", style(status).dim()));
    }

    fn set_progress(&self, progress: f64) {
        let percent = (progress.clamp(0.0, 1.0) * 100.0).round() as u32;

        let mut state = self.lock_state();
        if state.hidden || state.percent == Some(percent) {
            return;
        }
        state.percent = Some(percent);

        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "\r  {:>3}%", percent);
        let _ = stderr.flush();
    }

    fn ask_for_desktop_shortcut(&self, descriptor: &AppDescriptor) -> bool {
        self.confirm(&format_desktop_shortcut_prompt(descriptor), true)
    }

    fn show(&self) {
        self.lock_state().hidden = false;
    }

    fn hide(&self) {
        self.end_progress_line();
        self.lock_state().hidden = true;
    }
}
