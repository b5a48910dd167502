//! The run orchestrator.
//!
//! One run takes a boot descriptor (the file the user opened) to a running
//! app: install consent, locking, descriptor reconciliation, package update,
//! persistence, optional desktop shortcut and finally the launch.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::{App, AppGallery};
use crate::archive::{Extractor, ZipExtractor};
use crate::descriptor::{AppDescriptor, DescriptorContext};
use crate::error::LaunchError;
use crate::net::Retriever;
use crate::resolver::UrlResolver;
use crate::settings::Settings;
use crate::shortcut::{ShortcutCreator, ShortcutRequest};
use crate::ui::UserInterface;

/// Drives a single launch with its collaborators.
pub struct RunOrchestrator {
    settings: Settings,
    context: DescriptorContext,
    retriever: Arc<dyn Retriever>,
    extractor: Arc<dyn Extractor>,
    shortcuts: Option<Arc<dyn ShortcutCreator>>,
}

impl RunOrchestrator {
    /// Orchestrator for the running OS with the default resolver and zip
    /// extraction. No shortcuts are created until a creator is configured.
    pub fn new(settings: Settings, retriever: Arc<dyn Retriever>) -> Self {
        let resolver = Arc::new(UrlResolver::new(retriever.clone()));
        Self {
            settings,
            context: DescriptorContext::new(resolver),
            retriever,
            extractor: Arc::new(ZipExtractor),
            shortcuts: None,
        }
    }

    pub fn with_context(mut self, context: DescriptorContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_shortcut_creator(mut self, shortcuts: Arc<dyn ShortcutCreator>) -> Self {
        self.shortcuts = Some(shortcuts);
        self
    }

    /// Context to parse the boot descriptor with.
    pub fn context(&self) -> &DescriptorContext {
        &self.context
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Install or update the app described by `boot`, then run it.
    ///
    /// Fails with [`LaunchError::ExecutionCanceled`] when the user declines
    /// the first install.
    pub fn run(&self, boot: AppDescriptor, ui: &dyn UserInterface) -> anyhow::Result<()> {
        ui.set_header("Performing startup operations");
        ui.set_app(boot.name());

        let gallery = AppGallery::new(&self.settings.gallery_dir);
        let mut app = gallery.app(boot, self.context.clone(), self.retriever.clone());
        info!("App directory: {}", app.directory().display());

        let first_run = !app.directory_exists();
        debug!("First run: {}", first_run);

        if first_run {
            if !app.can_perform_first_run(ui) {
                info!("The user declined to install the app");
                return Err(LaunchError::ExecutionCanceled.into());
            }
            app.ensure_directory()?;
        }

        // Released on drop for every early return below
        app.lock()?;

        if let Some(local) = app.local_descriptor() {
            local.check_match(app.boot_descriptor())?;
            debug!("The local descriptor matches the boot descriptor");
        }

        if let Some(remote) = app.remote_descriptor()? {
            remote.check_match(app.boot_descriptor())?;
            debug!("The remote descriptor matches the boot descriptor");
        }

        let reference = app.reference_descriptor()?;
        reference.check_requirements()?;
        ui.set_app(&reference.title());

        let command_line = reference.command_line().to_vec();
        if command_line.is_empty() {
            return Err(LaunchError::EmptyCommandLine.into());
        }
        info!("Command line: {:?}", command_line);

        app.check_files(&self.settings, ui, self.extractor.as_ref())?;

        ui.set_header("Preparing the command...");
        let command = app.prepare_command(&command_line)?;

        let saved = app.save_reference_descriptor();
        // Only when this run created the app directory. Recovering from an
        // interrupted update also starts without a local descriptor, but the
        // user was already asked on the original install.
        if first_run && saved {
            self.offer_desktop_shortcut(&app, ui);
        }

        app.unlock()?;

        ui.set_header("Launching the application");
        app.launch(command, &self.settings, ui)
    }

    fn offer_desktop_shortcut(&self, app: &App, ui: &dyn UserInterface) {
        let Some(shortcuts) = &self.shortcuts else {
            return;
        };
        let reference = match app.reference_descriptor() {
            Ok(reference) => reference,
            Err(e) => {
                warn!("Cannot offer a desktop shortcut: {:#}", e);
                return;
            }
        };

        if !ui.ask_for_desktop_shortcut(reference) {
            info!("The user declined the desktop shortcut");
            return;
        }

        let request = ShortcutRequest {
            name: reference.name().to_string(),
            description: reference.description().to_string(),
            descriptor_path: app.local_descriptor_path().to_path_buf(),
            icon_path: app.actual_icon_path(),
        };

        if let Err(e) = shortcuts.create(&request) {
            warn!("Could not create the desktop shortcut: {:#}", e);
        }
    }
}

impl std::fmt::Debug for RunOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOrchestrator")
            .field("settings", &self.settings)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
