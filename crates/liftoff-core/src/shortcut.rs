//! Desktop shortcuts launching an installed app.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

/// What a shortcut should point to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutRequest {
    pub name: String,
    pub description: String,
    /// Local descriptor passed to the client when the shortcut is opened.
    pub descriptor_path: PathBuf,
    pub icon_path: Option<PathBuf>,
}

/// Creates desktop shortcuts.
pub trait ShortcutCreator: Send + Sync {
    /// Returns the path of the created shortcut.
    fn create(&self, request: &ShortcutRequest) -> anyhow::Result<PathBuf>;
}

/// Writes a `.desktop` entry (Linux) or a launcher script (macOS) to the
/// user's desktop directory.
#[derive(Debug, Clone)]
pub struct DesktopShortcutCreator {
    desktop_dir: PathBuf,
    executable: PathBuf,
}

impl DesktopShortcutCreator {
    pub fn new(desktop_dir: PathBuf, executable: PathBuf) -> Self {
        Self {
            desktop_dir,
            executable,
        }
    }

    /// Creator for the current user's desktop, launching the running binary.
    pub fn for_current_user() -> anyhow::Result<Self> {
        let desktop_dir = dirs::desktop_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine desktop directory"))?;
        let executable =
            std::env::current_exe().context("Could not determine the client executable")?;
        Ok(Self::new(desktop_dir, executable))
    }

    pub fn desktop_dir(&self) -> &Path {
        &self.desktop_dir
    }

    fn desktop_entry(&self, request: &ShortcutRequest) -> String {
        let icon = request
            .icon_path
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_default();

        format!(
            "[Desktop Entry]\nEncoding=UTF-8\nName={}\nComment={}\nExec=\"{}\" \"{}\"\nIcon={}\nVersion=1.0\nType=Application\nTerminal=0\n",
            request.name,
            request.description,
            self.executable.display(),
            request.descriptor_path.display(),
            icon
        )
    }

    fn launcher_script(&self, request: &ShortcutRequest) -> String {
        format!(
            "#!/bin/bash\n\"{}\" \"{}\"\n",
            self.executable.display(),
            request.descriptor_path.display()
        )
    }

    fn write(&self, path: &Path, content: &str, mode: u32) -> anyhow::Result<()> {
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write shortcut: {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        Ok(())
    }
}

impl ShortcutCreator for DesktopShortcutCreator {
    fn create(&self, request: &ShortcutRequest) -> anyhow::Result<PathBuf> {
        if !self.desktop_dir.is_dir() {
            anyhow::bail!(
                "Expected desktop directory not found: {}",
                self.desktop_dir.display()
            );
        }

        let base_name = shortcut_file_name(&request.name);
        let path = match std::env::consts::OS {
            "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => {
                let path = self.desktop_dir.join(format!("{}.desktop", base_name));
                self.write(&path, &self.desktop_entry(request), 0o600)?;
                path
            }
            "macos" => {
                let path = self.desktop_dir.join(base_name);
                self.write(&path, &self.launcher_script(request), 0o700)?;
                path
            }
            other => anyhow::bail!("Desktop shortcuts are not supported on {}", other),
        };

        info!("Desktop shortcut created: {}", path.display());
        Ok(path)
    }
}

/// Turn an app name into a safe file name.
pub fn shortcut_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = sanitized.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "app".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ShortcutRequest {
        ShortcutRequest {
            name: "Demo App".to_string(),
            description: "A demo".to_string(),
            descriptor_path: PathBuf::from("/apps/demo/App.liftoff"),
            icon_path: Some(PathBuf::from("/apps/demo/files/icon.png")),
        }
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(shortcut_file_name("Demo App"), "Demo App");
        assert_eq!(shortcut_file_name("a/b:c"), "a_b_c");
        assert_eq!(shortcut_file_name("..."), "app");
    }

    #[test]
    fn desktop_entry_launches_client_with_descriptor() {
        let creator = DesktopShortcutCreator::new(
            PathBuf::from("/desktop"),
            PathBuf::from("/usr/bin/liftoff"),
        );

        let entry = creator.desktop_entry(&request());
        assert!(entry.starts_with("[Desktop Entry]\n"));
        assert!(entry.contains("Name=Demo App\n"));
        assert!(entry.contains("Comment=A demo\n"));
        assert!(entry.contains("Exec=\"/usr/bin/liftoff\" \"/apps/demo/App.liftoff\"\n"));
        assert!(entry.contains("Icon=/apps/demo/files/icon.png\n"));
    }

    #[test]
    fn missing_desktop_directory_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let creator = DesktopShortcutCreator::new(
            temp.path().join("Desktop"),
            PathBuf::from("/usr/bin/liftoff"),
        );
        assert!(creator.create(&request()).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn creates_desktop_file_on_linux() {
        let temp = tempfile::TempDir::new().unwrap();
        let creator =
            DesktopShortcutCreator::new(temp.path().to_path_buf(), PathBuf::from("/usr/bin/liftoff"));

        let path = creator.create(&request()).unwrap();
        assert_eq!(path, temp.path().join("Demo App.desktop"));
        assert!(
            std::fs::read_to_string(&path)
                .unwrap()
                .contains("Type=Application")
        );
    }
}
