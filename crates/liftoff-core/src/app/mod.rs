//! An app bound to its on-disk directory.
//!
//! [`App`] owns the three descriptors a run deals with:
//!
//! - local: the copy saved in the app directory by the previous run
//! - remote: the copy currently published at the actual base URL
//! - reference: whichever of the two governs this run
//!
//! Each is computed lazily and at most once per run.

mod gallery;
mod update;

pub use gallery::AppGallery;
pub use update::UpdatePlan;

use std::cell::OnceCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::descriptor::{AppDescriptor, DescriptorContext};
use crate::error::LaunchError;
use crate::lock::DirectoryLock;
use crate::net::Retriever;
use crate::settings::Settings;
use crate::ui::UserInterface;

/// Subdirectory of the app directory receiving package contents.
pub const FILES_DIR_NAME: &str = "files";

const OUTPUT_SEPARATOR: &str = "------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceSource {
    Local,
    Remote,
}

pub struct App {
    directory: PathBuf,
    files_directory: PathBuf,
    local_descriptor_path: PathBuf,
    boot: AppDescriptor,
    context: DescriptorContext,
    retriever: Arc<dyn Retriever>,
    lock: Option<DirectoryLock>,
    local: OnceCell<Option<AppDescriptor>>,
    remote: OnceCell<Option<AppDescriptor>>,
    reference: OnceCell<ReferenceSource>,
}

impl App {
    pub fn new(
        directory: PathBuf,
        boot: AppDescriptor,
        context: DescriptorContext,
        retriever: Arc<dyn Retriever>,
    ) -> Self {
        let files_directory = directory.join(FILES_DIR_NAME);
        let local_descriptor_path = directory.join(boot.descriptor_file_name());

        Self {
            directory,
            files_directory,
            local_descriptor_path,
            boot,
            context,
            retriever,
            lock: None,
            local: OnceCell::new(),
            remote: OnceCell::new(),
            reference: OnceCell::new(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn files_directory(&self) -> &Path {
        &self.files_directory
    }

    pub fn local_descriptor_path(&self) -> &Path {
        &self.local_descriptor_path
    }

    pub fn boot_descriptor(&self) -> &AppDescriptor {
        &self.boot
    }

    pub fn directory_exists(&self) -> bool {
        self.directory.is_dir()
    }

    /// Ask the user whether the app may be installed.
    ///
    /// The untrusted prompt is used unless the declared URL is `https`.
    pub fn can_perform_first_run(&self, ui: &dyn UserInterface) -> bool {
        if self.boot.declared_base_url().scheme() == "https" {
            ui.ask_for_secure_first_run(&self.boot)
        } else {
            ui.ask_for_untrusted_first_run(&self.boot)
        }
    }

    pub fn ensure_directory(&self) -> anyhow::Result<()> {
        create_private_dir(&self.directory)
    }

    /// Take the directory lock for the rest of the run.
    pub fn lock(&mut self) -> anyhow::Result<()> {
        if self.lock.is_none() {
            self.lock = Some(DirectoryLock::acquire(&self.directory)?);
        }
        Ok(())
    }

    pub fn unlock(&mut self) -> anyhow::Result<()> {
        match self.lock.take() {
            Some(mut lock) => lock.release(),
            None => Ok(()),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock.as_ref().is_some_and(DirectoryLock::is_held)
    }

    /// Descriptor saved by the previous run, if it can be read.
    pub fn local_descriptor(&self) -> Option<&AppDescriptor> {
        self.local
            .get_or_init(|| {
                if !self.local_descriptor_path.is_file() {
                    info!("The local descriptor is missing");
                    return None;
                }

                match AppDescriptor::from_path(&self.local_descriptor_path, &self.context) {
                    Ok(descriptor) => {
                        info!("Local descriptor loaded: {}", descriptor.title());
                        Some(descriptor)
                    }
                    Err(e) => {
                        warn!("Ignoring the local descriptor: {:#}", e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Descriptor currently published for the app.
    ///
    /// Network and parsing problems make it unavailable; a disagreement
    /// between the release tag and the downloaded descriptor is an error.
    pub fn remote_descriptor(&self) -> anyhow::Result<Option<&AppDescriptor>> {
        if let Some(remote) = self.remote.get() {
            return Ok(remote.as_ref());
        }

        let remote = self.fetch_remote_descriptor();
        if let Some(descriptor) = &remote {
            descriptor.verify_release_version()?;
        }

        Ok(self.remote.get_or_init(|| remote).as_ref())
    }

    fn fetch_remote_descriptor(&self) -> Option<AppDescriptor> {
        let source = match self.local_descriptor() {
            Some(local) if local.skip_update_check() => {
                info!("Skipping the update check, as requested by the local descriptor");
                return None;
            }
            Some(local) => local,
            None => &self.boot,
        };

        let url = match source.file_url(source.descriptor_file_name()) {
            Ok(url) => url,
            Err(e) => {
                warn!("{:#}", e);
                return None;
            }
        };

        info!("Retrieving the remote descriptor from {}", url);
        let bytes = match self.retriever.retrieve(&url) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Remote descriptor unavailable: {:#}", e);
                return None;
            }
        };

        match AppDescriptor::from_bytes(&bytes, &self.context) {
            Ok(descriptor) => {
                info!("Remote descriptor loaded: {}", descriptor.title());
                Some(descriptor)
            }
            Err(e) => {
                warn!("Ignoring the remote descriptor: {:#}", e);
                None
            }
        }
    }

    /// Descriptor governing this run, chosen once.
    ///
    /// The remote descriptor wins only when strictly newer than the local one.
    pub fn reference_descriptor(&self) -> anyhow::Result<&AppDescriptor> {
        if let Some(source) = self.reference.get() {
            return self.descriptor_for(*source);
        }

        let local = self.local_descriptor();
        let remote = self.remote_descriptor()?;

        let source = match (local, remote) {
            (None, None) => return Err(LaunchError::NotInstalled.into()),
            (Some(local), None) => {
                if local.skip_update_check() {
                    info!("Using the local descriptor, as requested");
                } else {
                    warn!("The remote descriptor is missing, so the local descriptor will be used");
                }
                ReferenceSource::Local
            }
            (None, Some(_)) => {
                info!("The local descriptor is missing, so the remote descriptor will be used");
                ReferenceSource::Remote
            }
            (Some(local), Some(remote)) => {
                if remote.app_version().newer_than(local.app_version()) {
                    info!(
                        "Switching to the remote descriptor ({} is newer than {})",
                        remote.app_version(),
                        local.app_version()
                    );
                    ReferenceSource::Remote
                } else {
                    info!("Keeping the local descriptor, as the remote one is not newer");
                    ReferenceSource::Local
                }
            }
        };

        self.descriptor_for(*self.reference.get_or_init(|| source))
    }

    fn descriptor_for(&self, source: ReferenceSource) -> anyhow::Result<&AppDescriptor> {
        let descriptor = match source {
            ReferenceSource::Local => self.local_descriptor(),
            ReferenceSource::Remote => self.remote_descriptor()?,
        };
        descriptor.ok_or_else(|| anyhow::anyhow!("Reference descriptor is no longer available"))
    }

    /// Build the child process for `command_line`.
    ///
    /// The working directory is the files directory if present, otherwise
    /// the app directory. A relative program path with a separator is
    /// resolved against it.
    pub fn prepare_command(&self, command_line: &[String]) -> anyhow::Result<Command> {
        let (program, args) = command_line
            .split_first()
            .ok_or(LaunchError::EmptyCommandLine)?;

        let working_dir = if self.files_directory.is_dir() {
            &self.files_directory
        } else {
            &self.directory
        };
        debug!("Working directory: {}", working_dir.display());

        let program_path = Path::new(program);
        let program = if program_path.is_relative() && program_path.components().count() > 1 {
            working_dir.join(program_path)
        } else {
            program_path.to_path_buf()
        };

        let mut command = Command::new(program);
        command.args(args).current_dir(working_dir);
        Ok(command)
    }

    /// Persist the reference descriptor as the local one.
    ///
    /// Returns false, after logging, when that is not possible.
    pub fn save_reference_descriptor(&self) -> bool {
        let result = self.reference_descriptor().and_then(|reference| {
            let bytes = reference.to_json_bytes()?;
            std::fs::write(&self.local_descriptor_path, bytes).with_context(|| {
                format!(
                    "Failed to write {}",
                    self.local_descriptor_path.display()
                )
            })
        });

        match result {
            Ok(()) => {
                info!("Reference descriptor saved");
                true
            }
            Err(e) => {
                warn!("Could not save the reference descriptor: {:#}", e);
                false
            }
        }
    }

    /// Run the app to completion.
    pub fn launch(
        &self,
        mut command: Command,
        settings: &Settings,
        ui: &dyn UserInterface,
    ) -> anyhow::Result<()> {
        info!("Starting the app: {:?}", command);
        ui.hide();

        let status = if settings.skip_app_output {
            command
                .status()
                .with_context(|| format!("Failed to start {:?}", command.get_program()))?
        } else {
            let output = command
                .output()
                .with_context(|| format!("Failed to start {:?}", command.get_program()))?;

            if !output.stdout.is_empty() || !output.stderr.is_empty() {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", OUTPUT_SEPARATOR)?;
                stdout.write_all(&output.stdout)?;
                stdout.write_all(&output.stderr)?;
                writeln!(stdout)?;
                writeln!(stdout, "{}", OUTPUT_SEPARATOR)?;
            }
            output.status
        };

        if !status.success() {
            return Err(LaunchError::AppFailed(status).into());
        }

        info!("The app terminated successfully");
        Ok(())
    }

    /// Icon for shortcuts, relative to the files directory.
    pub fn actual_icon_path(&self) -> Option<PathBuf> {
        let reference = match self.reference_descriptor() {
            Ok(reference) => reference,
            Err(e) => {
                warn!("No reference descriptor for the icon: {:#}", e);
                return None;
            }
        };

        let icon = reference.icon_path();
        if icon.is_empty() {
            None
        } else {
            Some(self.files_directory.join(icon))
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("directory", &self.directory)
            .field("boot", &self.boot.title())
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

fn create_private_dir(path: &Path) -> anyhow::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}
