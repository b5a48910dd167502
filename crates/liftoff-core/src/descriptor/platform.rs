//! Operating-system naming used by descriptor override tables.

use std::collections::BTreeMap;

/// Wildcard key matching any operating system.
pub const ANY_OS: &str = "*";

/// Name of the running OS as written in descriptors.
///
/// Descriptors use Go-style names, so macOS is `darwin`.
pub fn current_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Look up `os` in an OS-keyed table, falling back to the wildcard entry.
///
/// Entries rejected by `usable` are treated as absent.
pub(crate) fn select_for_os<'a, T>(
    table: &'a BTreeMap<String, T>,
    os: &str,
    usable: impl Fn(&T) -> bool,
) -> Option<&'a T> {
    [os, ANY_OS]
        .into_iter()
        .filter_map(|key| table.get(key))
        .find(|value| usable(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("linux".to_string(), "linux.png".to_string()),
            ("windows".to_string(), String::new()),
            (ANY_OS.to_string(), "any.png".to_string()),
        ])
    }

    #[test]
    fn specific_os_wins_over_wildcard() {
        let table = table();
        let found = select_for_os(&table, "linux", |s| !s.is_empty());
        assert_eq!(found.map(String::as_str), Some("linux.png"));
    }

    #[test]
    fn unusable_entry_falls_back_to_wildcard() {
        let table = table();
        let found = select_for_os(&table, "windows", |s| !s.is_empty());
        assert_eq!(found.map(String::as_str), Some("any.png"));

        let found = select_for_os(&table, "darwin", |s| !s.is_empty());
        assert_eq!(found.map(String::as_str), Some("any.png"));
    }

    #[test]
    fn empty_table_yields_nothing() {
        let table: BTreeMap<String, String> = BTreeMap::new();
        assert!(select_for_os(&table, "linux", |_| true).is_none());
    }

    #[test]
    fn current_os_uses_descriptor_naming() {
        assert_ne!(current_os(), "macos");
        assert!(!current_os().is_empty());
    }
}
