//! App descriptors.
//!
//! A descriptor is a small JSON manifest naming an app, its distribution
//! point, its packages and its command line. Two schemas exist, selected by
//! the major number of `DescriptorVersion`:
//!
//! - 1.x / 2.x ([`RawDescriptorV1V2`]): OS-keyed icon path and command line
//! - 3.x ([`RawDescriptorV3`]): any setting overridable through an `OS` table
//!
//! Parsing happens in two phases: the version is sniffed first, then the
//! bytes are deserialized into the matching schema and resolved for the
//! target OS into a uniform [`AppDescriptor`].

mod packages;
mod platform;
mod schema_v1v2;
mod schema_v3;
mod validation;

pub use packages::{PackageVersion, PackageVersions, parse_package_versions};
pub use platform::{ANY_OS, current_os};
pub use schema_v1v2::RawDescriptorV1V2;
pub use schema_v3::{OsSettingsV3, RawDescriptorV3};

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::LaunchError;
use crate::resolver::{ActualBaseUrl, UrlResolver};
use crate::version::Version;

/// File name used when a descriptor does not declare one.
pub const DEFAULT_DESCRIPTOR_FILE_NAME: &str = "App.liftoff";

/// Environment shared by every descriptor parsed during a run.
#[derive(Clone)]
pub struct DescriptorContext {
    os: String,
    resolver: Arc<UrlResolver>,
}

impl DescriptorContext {
    /// Context targeting the running OS.
    pub fn new(resolver: Arc<UrlResolver>) -> Self {
        Self::with_os(current_os(), resolver)
    }

    /// Context targeting an explicit OS name (`linux`, `darwin`, `windows`).
    pub fn with_os(os: impl Into<String>, resolver: Arc<UrlResolver>) -> Self {
        Self {
            os: os.into(),
            resolver,
        }
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn resolver(&self) -> &Arc<UrlResolver> {
        &self.resolver
    }
}

impl std::fmt::Debug for DescriptorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorContext")
            .field("os", &self.os)
            .finish_non_exhaustive()
    }
}

/// Values of a descriptor after OS specialization.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DescriptorFields {
    pub descriptor_version: Version,
    pub declared_base_url: Url,
    pub descriptor_file_name: String,
    pub name: String,
    pub app_version: Version,
    pub publisher: String,
    pub description: String,
    pub package_versions: PackageVersions,
    pub command_line: Vec<String>,
    pub skip_package_levels: i64,
    pub skip_update_check: bool,
    pub icon_path: String,
    pub supported_os: Vec<String>,
    /// OS the fields were resolved for.
    pub os: String,
}

/// Schema a descriptor was read from.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDescriptor {
    V1V2(RawDescriptorV1V2),
    V3(RawDescriptorV3),
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescriptorHeader {
    #[serde(default)]
    descriptor_version: String,
}

/// A parsed, resolved and validated descriptor.
#[derive(Debug, Clone)]
pub struct AppDescriptor {
    raw: RawDescriptor,
    fields: DescriptorFields,
    actual: ActualBaseUrl,
}

impl AppDescriptor {
    /// Parse descriptor JSON.
    pub fn from_bytes(bytes: &[u8], context: &DescriptorContext) -> anyhow::Result<Self> {
        let header: DescriptorHeader =
            serde_json::from_slice(bytes).context("Failed to parse descriptor JSON")?;
        let descriptor_version = parse_version_field("DescriptorVersion", &header.descriptor_version)?;

        let raw = match descriptor_version.major {
            1 | 2 => {
                debug!("V1/V2 descriptor found");
                RawDescriptor::V1V2(
                    serde_json::from_slice(bytes).context("Failed to parse V1/V2 descriptor")?,
                )
            }
            3 => {
                debug!("V3 descriptor found");
                RawDescriptor::V3(
                    serde_json::from_slice(bytes).context("Failed to parse V3 descriptor")?,
                )
            }
            _ => {
                return Err(LaunchError::UnsupportedDescriptorVersion {
                    found: descriptor_version,
                    client: env!("CARGO_PKG_VERSION"),
                }
                .into());
            }
        };

        Self::from_raw(raw, context)
    }

    /// Read and parse a descriptor file.
    pub fn from_path(path: &Path, context: &DescriptorContext) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read descriptor: {}", path.display()))?;
        Self::from_bytes(&bytes, context)
            .with_context(|| format!("Invalid descriptor: {}", path.display()))
    }

    /// Resolve an already deserialized schema.
    pub fn from_raw(raw: RawDescriptor, context: &DescriptorContext) -> anyhow::Result<Self> {
        let fields = match &raw {
            RawDescriptor::V1V2(schema) => schema.resolve(context.os())?,
            RawDescriptor::V3(schema) => schema.resolve(context.os())?,
        };

        let actual = context
            .resolver()
            .resolve(&fields.declared_base_url, &fields.descriptor_file_name);

        let descriptor = Self { raw, fields, actual };
        validation::validate(&descriptor)?;

        info!(
            "Loaded descriptor for {} (descriptor version {})",
            descriptor.title(),
            descriptor.descriptor_version()
        );
        Ok(descriptor)
    }

    pub fn raw(&self) -> &RawDescriptor {
        &self.raw
    }

    pub fn descriptor_version(&self) -> &Version {
        &self.fields.descriptor_version
    }

    /// Distribution URL as written in the descriptor, with a trailing slash.
    pub fn declared_base_url(&self) -> &Url {
        &self.fields.declared_base_url
    }

    /// URL remote files are actually fetched from.
    pub fn actual_base_url(&self) -> &Url {
        &self.actual.url
    }

    /// Version of the release the actual URL was resolved to, if any.
    pub fn release_version(&self) -> Option<&Version> {
        self.actual.release_version.as_ref()
    }

    pub fn descriptor_file_name(&self) -> &str {
        &self.fields.descriptor_file_name
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn app_version(&self) -> &Version {
        &self.fields.app_version
    }

    pub fn publisher(&self) -> &str {
        &self.fields.publisher
    }

    pub fn description(&self) -> &str {
        &self.fields.description
    }

    pub fn package_versions(&self) -> &PackageVersions {
        &self.fields.package_versions
    }

    pub fn command_line(&self) -> &[String] {
        &self.fields.command_line
    }

    pub fn skip_package_levels(&self) -> usize {
        usize::try_from(self.fields.skip_package_levels).unwrap_or(0)
    }

    pub fn skip_update_check(&self) -> bool {
        self.fields.skip_update_check
    }

    pub fn icon_path(&self) -> &str {
        &self.fields.icon_path
    }

    /// Allowed OS names; empty means any.
    pub fn supported_os(&self) -> &[String] {
        &self.fields.supported_os
    }

    pub fn title(&self) -> String {
        format!("{} {}", self.fields.name, self.fields.app_version)
    }

    /// Fail if the app cannot run on the OS this descriptor was resolved for.
    pub fn check_requirements(&self) -> anyhow::Result<()> {
        let supported = &self.fields.supported_os;
        if !supported.is_empty() && !supported.iter().any(|os| *os == self.fields.os) {
            return Err(LaunchError::RequirementsNotMet(self.fields.os.clone()).into());
        }
        Ok(())
    }

    /// Resolve a path relative to the actual base URL.
    pub fn file_url(&self, relative_path: &str) -> anyhow::Result<Url> {
        if relative_path.starts_with('/') {
            anyhow::bail!("Absolute paths are not allowed: '{}'", relative_path);
        }
        self.actual
            .url
            .join(relative_path)
            .with_context(|| format!("Invalid relative path: '{}'", relative_path))
    }

    /// Fail unless `other` has the same name, file name and declared URL.
    pub fn check_match(&self, other: &AppDescriptor) -> anyhow::Result<()> {
        validation::check_match(self, other)?;
        Ok(())
    }

    /// Fail if the resolved release tag disagrees with the app version.
    pub fn verify_release_version(&self) -> anyhow::Result<()> {
        match self.release_version() {
            Some(tag) if tag != self.app_version() => Err(LaunchError::ReleaseVersionMismatch {
                tag: *tag,
                descriptor: *self.app_version(),
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// Serialize the schema this descriptor was read from.
    pub fn to_json_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let bytes = match &self.raw {
            RawDescriptor::V1V2(schema) => serde_json::to_vec_pretty(schema),
            RawDescriptor::V3(schema) => serde_json::to_vec_pretty(schema),
        };
        bytes.context("Failed to serialize descriptor")
    }
}

pub(crate) fn parse_version_field(field: &str, raw: &str) -> Result<Version, LaunchError> {
    if raw.is_empty() {
        return Err(LaunchError::Validation(format!("{} field is missing", field)));
    }
    Version::parse(raw)
        .map_err(|e| LaunchError::Validation(format!("Invalid {} field: {}", field, e)))
}

pub(crate) fn parse_declared_base_url(raw: &str) -> Result<Url, LaunchError> {
    if raw.is_empty() {
        return Err(LaunchError::Validation(
            "Declared Base URL field is missing".to_string(),
        ));
    }

    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };

    Url::parse(&normalized)
        .map_err(|e| LaunchError::Validation(format!("Invalid BaseURL '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(os: &str) -> DescriptorContext {
        DescriptorContext::with_os(os, Arc::new(UrlResolver::direct()))
    }

    const V3: &str = r#"{
        "DescriptorVersion": "3.0",
        "BaseURL": "https://example.com/apps/demo",
        "Name": "Demo",
        "Version": "2.1",
        "Publisher": "ACME",
        "Description": "Demo app",
        "SupportedOS": ["linux", "windows"],
        "PackageVersions": { "core": "2.1" },
        "CommandLine": ["bin/demo"]
    }"#;

    #[test]
    fn title_joins_name_and_version() {
        let descriptor = AppDescriptor::from_bytes(V3.as_bytes(), &context("linux")).unwrap();
        assert_eq!(descriptor.title(), "Demo 2.1");
    }

    #[test]
    fn direct_resolution_keeps_declared_url() {
        let descriptor = AppDescriptor::from_bytes(V3.as_bytes(), &context("linux")).unwrap();
        assert_eq!(descriptor.actual_base_url(), descriptor.declared_base_url());
        assert!(descriptor.release_version().is_none());
        descriptor.verify_release_version().unwrap();
    }

    #[test]
    fn file_url_resolves_against_actual_url() {
        let descriptor = AppDescriptor::from_bytes(V3.as_bytes(), &context("linux")).unwrap();

        assert_eq!(
            descriptor.file_url("core.zip").unwrap().as_str(),
            "https://example.com/apps/demo/core.zip"
        );
        assert_eq!(
            descriptor.file_url("packages/core.zip").unwrap().as_str(),
            "https://example.com/apps/demo/packages/core.zip"
        );
        assert!(descriptor.file_url("/etc/passwd").is_err());
    }

    #[test]
    fn requirements_follow_supported_os() {
        let linux = AppDescriptor::from_bytes(V3.as_bytes(), &context("linux")).unwrap();
        linux.check_requirements().unwrap();

        let darwin = AppDescriptor::from_bytes(V3.as_bytes(), &context("darwin")).unwrap();
        let err = darwin.check_requirements().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::RequirementsNotMet(os)) if os == "darwin"
        ));
    }

    #[test]
    fn unsupported_major_version_is_rejected() {
        let json = V3.replace("\"3.0\"", "\"4.0\"");
        let err = AppDescriptor::from_bytes(json.as_bytes(), &context("linux")).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::UnsupportedDescriptorVersion { .. })
        ));
    }

    #[test]
    fn missing_fields_fail_validation() {
        for (field, replacement) in [
            ("\"Name\": \"Demo\",", ""),
            ("\"Publisher\": \"ACME\",", ""),
            ("\"Description\": \"Demo app\",", ""),
            (",\n        \"CommandLine\": [\"bin/demo\"]", ""),
        ] {
            let json = V3.replace(field, replacement);
            assert_ne!(json, V3, "fixture did not contain {field}");

            let err = AppDescriptor::from_bytes(json.as_bytes(), &context("linux")).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<LaunchError>(),
                    Some(LaunchError::Validation(_))
                ),
                "removing {field} gave: {err:#}"
            );
        }
    }

    #[test]
    fn negative_skip_levels_fail_validation() {
        let json = V3.replace("\"Name\"", "\"SkipPackageLevels\": -1, \"Name\"");
        let err = AppDescriptor::from_bytes(json.as_bytes(), &context("linux")).unwrap_err();
        assert!(err.to_string().contains("SkipPackageLevels"));
    }

    #[test]
    fn declared_url_gets_trailing_slash() {
        assert_eq!(
            parse_declared_base_url("https://example.com/a").unwrap().as_str(),
            "https://example.com/a/"
        );
        assert_eq!(
            parse_declared_base_url("https://example.com/a/").unwrap().as_str(),
            "https://example.com/a/"
        );
        assert!(parse_declared_base_url("").is_err());
        assert!(parse_declared_base_url("not a url").is_err());
    }
}
