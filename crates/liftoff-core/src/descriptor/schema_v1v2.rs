//! Descriptor schema for descriptor versions 1.x and 2.x.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::packages::parse_package_versions;
use super::platform::select_for_os;
use super::{
    DEFAULT_DESCRIPTOR_FILE_NAME, DescriptorFields, parse_declared_base_url, parse_version_field,
};
use crate::error::LaunchError;

/// On-disk shape of a V1/V2 descriptor.
///
/// Only the icon path and the command line can vary by OS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDescriptorV1V2 {
    pub descriptor_version: String,

    #[serde(rename = "BaseURL", default)]
    pub base_url: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub publisher: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub icon_path: BTreeMap<String, String>,

    #[serde(default)]
    pub skip_update_check: bool,
    #[serde(default)]
    pub skip_package_levels: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub command_line: BTreeMap<String, Vec<String>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub package_versions: BTreeMap<String, String>,
}

/// Treat an explicit JSON `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawDescriptorV1V2 {
    pub(crate) fn resolve(&self, os: &str) -> Result<DescriptorFields, LaunchError> {
        let icon_path = select_for_os(&self.icon_path, os, |path| !path.is_empty())
            .cloned()
            .unwrap_or_default();
        let command_line = select_for_os(&self.command_line, os, |_| true)
            .cloned()
            .unwrap_or_default();

        Ok(DescriptorFields {
            descriptor_version: parse_version_field("DescriptorVersion", &self.descriptor_version)?,
            declared_base_url: parse_declared_base_url(&self.base_url)?,
            descriptor_file_name: DEFAULT_DESCRIPTOR_FILE_NAME.to_string(),
            name: self.name.clone(),
            app_version: parse_version_field("Version", &self.version)?,
            publisher: self.publisher.clone(),
            description: self.description.clone(),
            package_versions: parse_package_versions(&self.package_versions)?,
            command_line,
            skip_package_levels: self.skip_package_levels,
            skip_update_check: self.skip_update_check,
            icon_path,
            supported_os: Vec::new(),
            os: os.to_string(),
        })
    }
}
