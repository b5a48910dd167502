//! Four-part application versions.
//!
//! Versions have the shape `major.minor[.build[.release]]`; missing trailing
//! components are zero. Ordering is lexicographic over the four components.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version format: '{0}'")]
    InvalidFormat(String),
}

/// A comparable `major.minor.build.release` version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub build: u64,
    pub release: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, build: u64, release: u64) -> Self {
        Self {
            major,
            minor,
            build,
            release,
        }
    }

    /// Parse a dotted version string.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let components: Vec<&str> = input.split('.').collect();
        // A fifth component is an error rather than silently dropped
        if components.len() > 4 {
            return Err(VersionError::InvalidFormat(input.to_string()));
        }

        let mut values = [0u64; 4];
        for (slot, component) in values.iter_mut().zip(&components) {
            if component.is_empty() || !component.chars().all(|c| c.is_ascii_digit()) {
                return Err(VersionError::InvalidFormat(input.to_string()));
            }
            *slot = component
                .parse()
                .map_err(|_| VersionError::InvalidFormat(input.to_string()))?;
        }

        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }

    /// True if `self` is strictly greater than `other`.
    pub fn newer_than(&self, other: &Version) -> bool {
        self.cmp(other) == Ordering::Greater
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.build == 0 && self.release == 0 {
            return Ok(());
        }
        write!(f, ".{}", self.build)?;
        if self.release != 0 {
            write!(f, ".{}", self.release)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fills_missing_components_with_zero() {
        assert_eq!(Version::parse("2").unwrap(), Version::new(2, 0, 0, 0));
        assert_eq!(Version::parse("2.3").unwrap(), Version::new(2, 3, 0, 0));
        assert_eq!(Version::parse("2.3.1").unwrap(), Version::new(2, 3, 1, 0));
        assert_eq!(Version::parse("2.3.1.7").unwrap(), Version::new(2, 3, 1, 7));
    }

    #[test]
    fn extra_components_are_rejected_not_truncated() {
        for input in ["1.2.3.4.5", "1.0.0.0.0"] {
            assert_eq!(
                Version::parse(input),
                Err(VersionError::InvalidFormat(input.to_string())),
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn parse_rejects_invalid_components() {
        for input in ["", "1.", "a.b", "1.-2", "1.2beta", " 1.2", "+1"] {
            assert_eq!(
                Version::parse(input),
                Err(VersionError::InvalidFormat(input.to_string())),
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn display_is_canonical() {
        let cases = [
            ("1", "1.0"),
            ("1.0", "1.0"),
            ("1.0.0", "1.0"),
            ("1.0.0.0", "1.0"),
            ("1.2.3", "1.2.3"),
            ("1.2.3.0", "1.2.3"),
            ("1.2.0.4", "1.2.0.4"),
            ("0.0.0.1", "0.0.0.1"),
        ];

        for (input, expected) in cases {
            assert_eq!(Version::parse(input).unwrap().to_string(), expected);
        }
    }

    #[test]
    fn canonical_string_parses_back_to_same_version() {
        for input in ["3", "3.1", "3.1.4", "3.1.4.1", "10.0.0.2"] {
            let version = Version::parse(input).unwrap();
            assert_eq!(Version::parse(&version.to_string()).unwrap(), version);
        }
    }

    #[test]
    fn newer_than_is_strict_and_componentwise() {
        let ordered = ["0.9", "1.0", "1.0.0.1", "1.0.1", "1.1", "1.10", "2.0"];
        let versions: Vec<Version> = ordered.iter().map(|v| v.parse().unwrap()).collect();

        for (i, left) in versions.iter().enumerate() {
            assert!(!left.newer_than(left));
            for (j, right) in versions.iter().enumerate() {
                assert_eq!(left.newer_than(right), i > j, "{left} vs {right}");
                assert_eq!(left.newer_than(right), left.cmp(right) == Ordering::Greater);
            }
        }
    }

    #[test]
    fn serde_uses_canonical_string() {
        let version = Version::new(1, 4, 0, 0);
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"1.4\"");

        let parsed: Version = serde_json::from_str("\"1.4.2\"").unwrap();
        assert_eq!(parsed, Version::new(1, 4, 2, 0));

        assert!(serde_json::from_str::<Version>("\"nope\"").is_err());
    }
}
