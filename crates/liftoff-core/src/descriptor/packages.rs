//! Package version tables.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::LaunchError;
use crate::version::Version;

/// Declared version of a single package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageVersion {
    /// Declared with an empty string: always re-downloaded.
    Unknown,
    Known(Version),
}

impl PackageVersion {
    pub fn known(&self) -> Option<&Version> {
        match self {
            PackageVersion::Known(version) => Some(version),
            PackageVersion::Unknown => None,
        }
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageVersion::Unknown => write!(f, "unknown"),
            PackageVersion::Known(version) => write!(f, "{}", version),
        }
    }
}

/// Package name to declared version.
pub type PackageVersions = BTreeMap<String, PackageVersion>;

/// Parse the raw `PackageVersions` table of a descriptor.
pub fn parse_package_versions(
    raw: &BTreeMap<String, String>,
) -> Result<PackageVersions, LaunchError> {
    raw.iter()
        .map(|(name, version)| {
            if version.is_empty() {
                return Ok((name.clone(), PackageVersion::Unknown));
            }
            let parsed = Version::parse(version).map_err(|_| {
                LaunchError::Validation(format!(
                    "Invalid version string for package '{}': '{}'",
                    name, version
                ))
            })?;
            Ok((name.clone(), PackageVersion::Known(parsed)))
        })
        .collect()
}
