//! User interface contract used during a run.

use crate::descriptor::AppDescriptor;

/// Front-end driven by the run orchestrator.
///
/// All methods take `&self` so a front-end can be shared with the thread
/// that owns its event loop.
pub trait UserInterface: Send + Sync {
    fn show_error(&self, message: &str);

    /// Ask for consent before the first install from an `https` URL.
    fn ask_for_secure_first_run(&self, descriptor: &AppDescriptor) -> bool;

    /// Ask for consent before the first install from a non-`https` URL.
    fn ask_for_untrusted_first_run(&self, descriptor: &AppDescriptor) -> bool;

    fn set_app(&self, title: &str);
    fn set_header(&self, header: &str);
    fn set_status(&self, status: &str);

    /// Progress of the current step, in `[0, 1]`.
    fn set_progress(&self, progress: f64);

    fn ask_for_desktop_shortcut(&self, descriptor: &AppDescriptor) -> bool;

    fn show(&self);
    fn hide(&self);
}

pub fn format_secure_first_run_prompt(descriptor: &AppDescriptor) -> String {
    format!(
        "You are running an application for the first time.\n\n\nTitle:   {}\n\nPublisher:   {}\n\nAddress:   {}\n\n\nDo you wish to proceed?",
        descriptor.title(),
        descriptor.publisher(),
        descriptor.declared_base_url()
    )
}

pub fn format_untrusted_first_run_prompt(descriptor: &AppDescriptor) -> String {
    format!(
        "{}\n\n\nWARNING: the provided address is insecure, so the integrity of the application files might be compromised by third parties during the download process.",
        format_secure_first_run_prompt(descriptor)
    )
}

pub fn format_desktop_shortcut_prompt(_descriptor: &AppDescriptor) -> String {
    "Would you like to create a desktop shortcut for the application?".to_string()
}
