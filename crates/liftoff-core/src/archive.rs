//! Package archive extraction.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;

/// Extracts a downloaded package into the app files directory.
pub trait Extractor: Send + Sync {
    /// Extract `archive` into `target`, dropping the first `skip_levels`
    /// path components of every entry.
    fn extract(&self, archive: &Path, target: &Path, skip_levels: usize) -> anyhow::Result<()>;
}

/// Extractor for zip archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl Extractor for ZipExtractor {
    fn extract(&self, archive: &Path, target: &Path, skip_levels: usize) -> anyhow::Result<()> {
        let file = File::open(archive)
            .with_context(|| format!("Failed to open package archive: {}", archive.display()))?;
        let mut zip = zip::ZipArchive::new(file)
            .with_context(|| format!("Failed to read {} as zip archive", archive.display()))?;

        std::fs::create_dir_all(target)
            .with_context(|| format!("Failed to create directory: {}", target.display()))?;

        for i in 0..zip.len() {
            let mut entry = zip
                .by_index(i)
                .with_context(|| format!("Failed to read zip entry {}", i))?;

            // Entries escaping the archive root are skipped
            let Some(enclosed) = entry.enclosed_name() else {
                continue;
            };
            let Some(relative) = strip_levels(&enclosed, skip_levels) else {
                continue;
            };
            let outpath = target.join(relative);

            if entry.is_dir() {
                std::fs::create_dir_all(&outpath).with_context(|| {
                    format!("Failed to create directory: {}", outpath.display())
                })?;
                continue;
            }

            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create parent directory: {}", parent.display())
                })?;
            }

            let mut outfile = File::create(&outpath)
                .with_context(|| format!("Failed to create file: {}", outpath.display()))?;
            std::io::copy(&mut entry, &mut outfile)
                .with_context(|| format!("Failed to extract zip entry: {}", entry.name()))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))
                        .ok();
                }
            }
        }

        Ok(())
    }
}

/// Drop the first `levels` normal components of `path`.
///
/// Returns `None` when nothing is left.
fn strip_levels(path: &Path, levels: usize) -> Option<PathBuf> {
    let remaining: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .skip(levels)
        .collect();

    if remaining.as_os_str().is_empty() {
        None
    } else {
        Some(remaining)
    }
}
