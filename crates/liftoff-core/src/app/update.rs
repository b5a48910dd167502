//! Package diff and installation.

use std::io::{BufWriter, Write};

use anyhow::Context;
use tracing::{debug, info};

use super::App;
use crate::archive::Extractor;
use crate::descriptor::{AppDescriptor, PackageVersion, PackageVersions};
use crate::settings::Settings;
use crate::ui::UserInterface;
use crate::version::Version;

/// Packages to download for a remote descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    /// Package names, sorted.
    pub packages: Vec<String>,
    /// Whether the plan covers every remote package.
    pub full_install: bool,
}

impl UpdatePlan {
    /// Compare `remote` with the installed `local` descriptor.
    ///
    /// Without a local descriptor every remote package is needed. Otherwise
    /// nothing is needed unless the remote app version is strictly newer, in
    /// which case a package is needed when either side declares it unknown,
    /// the local side lacks it, or the remote version is strictly newer.
    /// Packages only known locally are left alone.
    pub fn compute(remote: &AppDescriptor, local: Option<&AppDescriptor>) -> Self {
        Self::between(
            remote.app_version(),
            remote.package_versions(),
            local.map(|local| (local.app_version(), local.package_versions())),
        )
    }

    pub fn between(
        remote_version: &Version,
        remote_packages: &PackageVersions,
        local: Option<(&Version, &PackageVersions)>,
    ) -> Self {
        let packages: Vec<String> = match local {
            None => remote_packages.keys().cloned().collect(),
            Some((local_version, _)) if !remote_version.newer_than(local_version) => Vec::new(),
            Some((_, local_packages)) => remote_packages
                .iter()
                .filter(|(name, remote)| package_needs_update(remote, local_packages.get(*name)))
                .map(|(name, _)| name.clone())
                .collect(),
        };

        let full_install = !packages.is_empty() && packages.len() == remote_packages.len();
        Self {
            packages,
            full_install,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }
}

fn package_needs_update(remote: &PackageVersion, local: Option<&PackageVersion>) -> bool {
    match (remote, local) {
        (PackageVersion::Unknown, _) => true,
        (_, None) | (_, Some(PackageVersion::Unknown)) => true,
        (PackageVersion::Known(remote), Some(PackageVersion::Known(local))) => {
            remote.newer_than(local)
        }
    }
}

impl App {
    /// Bring the files directory up to date with the remote descriptor.
    ///
    /// Before the first download the local descriptor is deleted, so an
    /// interrupted update is never mistaken for a complete install. A full
    /// update also wipes the files directory first.
    pub fn check_files(
        &self,
        settings: &Settings,
        ui: &dyn UserInterface,
        extractor: &dyn Extractor,
    ) -> anyhow::Result<()> {
        let Some(remote) = self.remote_descriptor()? else {
            info!("Skipping the file check, as the remote descriptor is missing");
            return Ok(());
        };

        ui.set_header("Checking the app files");

        let plan = UpdatePlan::compute(remote, self.local_descriptor());
        if plan.is_empty() {
            info!("All the packages are up to date");
            return Ok(());
        }

        if self.local_descriptor_path.exists() {
            std::fs::remove_file(&self.local_descriptor_path).with_context(|| {
                format!(
                    "Failed to delete the local descriptor: {}",
                    self.local_descriptor_path.display()
                )
            })?;
            debug!("Local descriptor deleted before updating");
        }

        if plan.full_install && self.files_directory.exists() {
            std::fs::remove_dir_all(&self.files_directory).with_context(|| {
                format!(
                    "Failed to remove the files directory: {}",
                    self.files_directory.display()
                )
            })?;
            debug!("Files directory removed for a full install");
        }

        for (index, package) in plan.packages.iter().enumerate() {
            ui.set_header(&format!(
                "Updating package {} of {}: {}",
                index + 1,
                plan.len(),
                package
            ));
            self.install_package(remote, package, settings, ui, extractor)
                .with_context(|| format!("Failed to install package '{}'", package))?;
        }

        info!("App files checked");
        Ok(())
    }

    fn install_package(
        &self,
        remote: &AppDescriptor,
        package: &str,
        settings: &Settings,
        ui: &dyn UserInterface,
        extractor: &dyn Extractor,
    ) -> anyhow::Result<()> {
        let url = remote.file_url(package)?;

        // Removed when dropped, whatever happens below
        let mut temp = tempfile::Builder::new()
            .prefix("liftoff-package-")
            .tempfile()
            .context("Failed to create a temporary package file")?;

        info!("Retrieving package {}", url);
        {
            let mut writer = BufWriter::with_capacity(settings.buffer_size, temp.as_file_mut());
            self.retriever.retrieve_to(&url, &mut writer, &mut |retrieved, total| {
                if let Some(total) = total.filter(|total| *total > 0) {
                    ui.set_progress(retrieved as f64 / total as f64);
                }
            })?;
            writer
                .flush()
                .context("Failed to write the temporary package file")?;
        }

        super::create_private_dir(&self.files_directory)?;

        info!(
            "Extracting package {} (skipping {} levels)",
            package,
            remote.skip_package_levels()
        );
        extractor.extract(
            temp.path(),
            &self.files_directory,
            remote.skip_package_levels(),
        )?;

        Ok(())
    }
}
