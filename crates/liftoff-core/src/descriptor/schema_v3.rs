//! Descriptor schema for descriptor version 3.x.
//!
//! Every app-level setting may be overridden per OS through the `OS` table.
//! Lookup order for each field is: running OS entry, then the `*` entry,
//! then the top-level value. Identity fields (`BaseURL`,
//! `DescriptorFileName`) are not overridable since they determine where the
//! app lives on disk.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::packages::parse_package_versions;
use super::platform::ANY_OS;
use super::{
    DEFAULT_DESCRIPTOR_FILE_NAME, DescriptorFields, parse_declared_base_url, parse_version_field,
};
use crate::error::LaunchError;

/// Settings that can appear both at top level and inside the `OS` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OsSettingsV3 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_package_levels: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_update_check: Option<bool>,

    #[serde(rename = "SupportedOS", default, skip_serializing_if = "Option::is_none")]
    pub supported_os: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_versions: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<String>,
}

/// On-disk shape of a V3 descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDescriptorV3 {
    pub descriptor_version: String,

    #[serde(rename = "BaseURL", default)]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub descriptor_file_name: String,

    #[serde(flatten)]
    pub settings: OsSettingsV3,

    #[serde(rename = "OS", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub os: BTreeMap<String, OsSettingsV3>,
}

impl RawDescriptorV3 {
    /// First value yielded by the override chain for `os`.
    fn pick<'a, T: ?Sized>(
        &'a self,
        os: &str,
        field: impl Fn(&'a OsSettingsV3) -> Option<&'a T>,
    ) -> Option<&'a T> {
        [os, ANY_OS]
            .into_iter()
            .filter_map(|key| self.os.get(key))
            .chain(std::iter::once(&self.settings))
            .find_map(field)
    }

    fn pick_text(&self, os: &str, field: impl Fn(&OsSettingsV3) -> Option<&String>) -> String {
        self.pick(os, |settings| field(settings).filter(|text| !text.is_empty()))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn resolve(&self, os: &str) -> Result<DescriptorFields, LaunchError> {
        let descriptor_file_name = if self.descriptor_file_name.is_empty() {
            DEFAULT_DESCRIPTOR_FILE_NAME.to_string()
        } else {
            self.descriptor_file_name.clone()
        };

        let version = self.pick_text(os, |s| s.version.as_ref());
        let empty = BTreeMap::new();
        let package_versions = self
            .pick(os, |s| s.package_versions.as_ref())
            .unwrap_or(&empty);

        Ok(DescriptorFields {
            descriptor_version: parse_version_field("DescriptorVersion", &self.descriptor_version)?,
            declared_base_url: parse_declared_base_url(&self.base_url)?,
            descriptor_file_name,
            name: self.pick_text(os, |s| s.name.as_ref()),
            app_version: parse_version_field("Version", &version)?,
            publisher: self.pick_text(os, |s| s.publisher.as_ref()),
            description: self.pick_text(os, |s| s.description.as_ref()),
            package_versions: parse_package_versions(package_versions)?,
            command_line: self
                .pick(os, |s| s.command_line.as_ref())
                .cloned()
                .unwrap_or_default(),
            skip_package_levels: self
                .pick(os, |s| s.skip_package_levels.as_ref())
                .copied()
                .unwrap_or(0),
            skip_update_check: self
                .pick(os, |s| s.skip_update_check.as_ref())
                .copied()
                .unwrap_or(false),
            icon_path: self.pick_text(os, |s| s.icon_path.as_ref()),
            supported_os: self
                .pick(os, |s| s.supported_os.as_ref())
                .cloned()
                .unwrap_or_default(),
            os: os.to_string(),
        })
    }
}
