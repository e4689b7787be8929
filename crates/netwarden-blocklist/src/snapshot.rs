//! Immutable blocklist snapshots

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// An immutable set of blocked IP addresses plus display metadata
#[derive(Debug, Clone, Serialize)]
pub struct BlocklistSnapshot {
    ips: HashSet<String>,
    last_added: Vec<String>,
    loaded_at: Option<DateTime<Utc>>,
    origin: Option<String>,
}

impl BlocklistSnapshot {
    /// The snapshot in force before anything was loaded
    pub fn empty() -> Self {
        Self {
            ips: HashSet::new(),
            last_added: Vec::new(),
            loaded_at: None,
            origin: None,
        }
    }

    /// Parse a newline-delimited document.
    ///
    /// Blank lines and lines starting with `#` are ignored; every other line
    /// (trimmed) becomes one entry. The last `sample_size` entries in file
    /// order are kept for display.
    pub fn parse(text: &str, sample_size: usize) -> Self {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();

        let sample_start = lines.len().saturating_sub(sample_size);

        Self {
            ips: lines.iter().map(|line| line.to_string()).collect(),
            last_added: lines[sample_start..].iter().map(|s| s.to_string()).collect(),
            loaded_at: Some(Utc::now()),
            origin: None,
        }
    }

    /// Record where the snapshot came from
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Whether `ip` is blocked
    pub fn contains(&self, ip: &str) -> bool {
        self.ips.contains(ip)
    }

    /// Number of distinct entries
    pub fn count(&self) -> usize {
        self.ips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ips.is_empty()
    }

    /// Most recently added entries, oldest first
    pub fn last_added(&self) -> &[String] {
        &self.last_added
    }

    /// All entries in sorted order
    pub fn sorted_ips(&self) -> Vec<&str> {
        let mut ips: Vec<&str> = self.ips.iter().map(String::as_str).collect();
        ips.sort_unstable();
        ips
    }

    /// When the snapshot was built
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// File or URL the snapshot was built from
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

impl Default for BlocklistSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_comments_and_blanks() {
        let snapshot = BlocklistSnapshot::parse("1.2.3.4\n#comment\n\n5.6.7.8\n", 10);

        assert_eq!(snapshot.count(), 2);
        assert!(snapshot.contains("1.2.3.4"));
        assert!(snapshot.contains("5.6.7.8"));
        assert!(!snapshot.contains("#comment"));
        assert_eq!(snapshot.sorted_ips(), vec!["1.2.3.4", "5.6.7.8"]);
    }

    #[test]
    fn test_every_entry_exactly_once() {
        let source = "9.9.9.9\r\n  10.0.0.1  \n# header\n9.9.9.9\n\n\n2001:db8::1\n";
        let snapshot = BlocklistSnapshot::parse(source, 10);

        let expected: HashSet<&str> = ["9.9.9.9", "10.0.0.1", "2001:db8::1"].into();
        let actual: HashSet<&str> = snapshot.sorted_ips().into_iter().collect();
        assert_eq!(actual, expected);
        assert_eq!(snapshot.count(), 3);
    }

    #[test]
    fn test_last_added_sample() {
        let source: String = (1..=15).map(|i| format!("10.0.0.{}\n", i)).collect();
        let snapshot = BlocklistSnapshot::parse(&source, 10);

        assert_eq!(snapshot.last_added().len(), 10);
        assert_eq!(snapshot.last_added()[0], "10.0.0.6");
        assert_eq!(snapshot.last_added()[9], "10.0.0.15");

        let small = BlocklistSnapshot::parse("1.1.1.1\n", 10);
        assert_eq!(small.last_added(), ["1.1.1.1".to_string()]);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = BlocklistSnapshot::empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.loaded_at().is_none());
        assert!(snapshot.origin().is_none());
    }
}
