//! Mapping from descriptors to app directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::descriptor::{AppDescriptor, DescriptorContext};
use crate::net::Retriever;

use super::App;

/// Root directory holding one directory per installed app.
#[derive(Debug, Clone)]
pub struct AppGallery {
    directory: PathBuf,
}

impl AppGallery {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Directory of the app described by `boot`.
    ///
    /// Built from the declared base URL as `<gallery>/<host>/<path...>`,
    /// with `:` in the host replaced by `_`. For GitHub, a trailing
    /// `releases/latest` is dropped so every release shares one directory.
    pub fn resolve_app_dir(&self, boot: &AppDescriptor) -> PathBuf {
        let base_url = boot.declared_base_url();

        let mut host = base_url.host_str().unwrap_or_default().replace(':', "_");
        if let Some(port) = base_url.port() {
            host = format!("{}_{}", host, port);
        }

        let mut segments: Vec<&str> = base_url
            .path()
            .trim_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .collect();

        if host == "github.com" && segments.ends_with(&["releases", "latest"]) {
            segments.truncate(segments.len() - 2);
        }

        let mut app_dir = self.directory.join(host);
        app_dir.extend(segments);
        app_dir
    }

    /// Bind `boot` to its app directory.
    pub fn app(
        &self,
        boot: AppDescriptor,
        context: DescriptorContext,
        retriever: Arc<dyn Retriever>,
    ) -> App {
        let directory = self.resolve_app_dir(&boot);
        App::new(directory, boot, context, retriever)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::UrlResolver;

    fn boot(base_url: &str) -> AppDescriptor {
        let json = format!(
            r#"{{
                "DescriptorVersion": "3.0",
                "BaseURL": "{}",
                "Name": "Demo",
                "Version": "1.0",
                "Publisher": "ACME",
                "Description": "Demo app",
                "CommandLine": ["demo"]
            }}"#,
            base_url
        );
        let context = DescriptorContext::with_os("linux", Arc::new(UrlResolver::direct()));
        AppDescriptor::from_bytes(json.as_bytes(), &context).unwrap()
    }

    #[test]
    fn host_and_path_segments_form_the_directory() {
        let gallery = AppGallery::new("/gallery");

        assert_eq!(
            gallery.resolve_app_dir(&boot("https://example.com/apps/demo/")),
            Path::new("/gallery/example.com/apps/demo")
        );
    }

    #[test]
    fn port_is_appended_to_host() {
        let gallery = AppGallery::new("/gallery");

        assert_eq!(
            gallery.resolve_app_dir(&boot("http://localhost:8080/demo")),
            Path::new("/gallery/localhost_8080/demo")
        );
    }

    #[test]
    fn github_latest_release_suffix_is_dropped() {
        let gallery = AppGallery::new("/gallery");

        assert_eq!(
            gallery.resolve_app_dir(&boot("https://github.com/acme/demo/releases/latest")),
            Path::new("/gallery/github.com/acme/demo")
        );
        assert_eq!(
            gallery.resolve_app_dir(&boot("https://example.com/acme/releases/latest")),
            Path::new("/gallery/example.com/acme/releases/latest")
        );
    }
}
