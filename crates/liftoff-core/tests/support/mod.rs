#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use liftoff_core::descriptor::{AppDescriptor, DescriptorContext};
use liftoff_core::net::Retriever;
use liftoff_core::resolver::UrlResolver;
use liftoff_core::ui::UserInterface;
use url::Url;

// =========================================================================
// Descriptors
// =========================================================================

pub const BASE_URL: &str = "https://example.com/apps/demo/";

/// V3 descriptor JSON with the given version, packages and command line.
pub fn descriptor_json(version: &str, packages: &[(&str, &str)], command: &[&str]) -> String {
    let packages: serde_json::Map<String, serde_json::Value> = packages
        .iter()
        .map(|(name, version)| (name.to_string(), serde_json::Value::from(*version)))
        .collect();

    serde_json::json!({
        "DescriptorVersion": "3.0",
        "BaseURL": BASE_URL,
        "Name": "Demo",
        "Version": version,
        "Publisher": "ACME",
        "Description": "Demo app",
        "PackageVersions": packages,
        "CommandLine": command,
    })
    .to_string()
}

pub fn direct_context() -> DescriptorContext {
    DescriptorContext::with_os("linux", Arc::new(UrlResolver::direct()))
}

pub fn parse(json: &str) -> AppDescriptor {
    AppDescriptor::from_bytes(json.as_bytes(), &direct_context()).expect("valid descriptor")
}

// =========================================================================
// Retriever
// =========================================================================

/// Serves fixed responses by URL and records every request.
#[derive(Default)]
pub struct MapRetriever {
    responses: Mutex<HashMap<String, Vec<u8>>>,
    requests: Mutex<Vec<String>>,
}

impl MapRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), body.into());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Retriever for MapRetriever {
    fn retrieve(&self, url: &Url) -> anyhow::Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("404 Not Found: {}", url))
    }
}

// =========================================================================
// User interface
// =========================================================================

/// Scripted answers plus a log of every call.
pub struct RecordingUi {
    pub consent: bool,
    pub shortcut: bool,
    events: Mutex<Vec<String>>,
}

impl RecordingUi {
    pub fn new(consent: bool) -> Self {
        Self {
            consent,
            shortcut: false,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn saw(&self, prefix: &str) -> bool {
        self.events().iter().any(|event| event.starts_with(prefix))
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl UserInterface for RecordingUi {
    fn show_error(&self, message: &str) {
        self.record(format!("error: {}", message));
    }

    fn ask_for_secure_first_run(&self, descriptor: &AppDescriptor) -> bool {
        self.record(format!("secure first run: {}", descriptor.title()));
        self.consent
    }

    fn ask_for_untrusted_first_run(&self, descriptor: &AppDescriptor) -> bool {
        self.record(format!("untrusted first run: {}", descriptor.title()));
        self.consent
    }

    fn set_app(&self, title: &str) {
        self.record(format!("app: {}", title));
    }

    fn set_header(&self, header: &str) {
        self.record(format!("header: {}", header));
    }

    fn set_status(&self, status: &str) {
        self.record(format!("status: {}", status));
    }

    fn set_progress(&self, progress: f64) {
        self.record(format!("progress: {:.2}", progress));
    }

    fn ask_for_desktop_shortcut(&self, descriptor: &AppDescriptor) -> bool {
        self.record(format!("shortcut: {}", descriptor.title()));
        self.shortcut
    }

    fn show(&self) {
        self.record("show".to_string());
    }

    fn hide(&self) {
        self.record("hide".to_string());
    }
}

// =========================================================================
// Archives
// =========================================================================

/// Zip archive with the given files.
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(0o755);

        for (name, content) in files {
            zip.start_file(*name, options)
                .expect("Failed to start zip entry");
            zip.write_all(content).expect("Failed to write zip entry");
        }
        zip.finish().expect("Failed to finish zip");
    }
    buf.into_inner()
}
