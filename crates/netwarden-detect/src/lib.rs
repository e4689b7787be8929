//! Threat classification for netwarden
//!
//! A connection is suspicious when its owning process name contains a
//! known tool keyword, when its remote port is a commonly abused port, or
//! when either endpoint's IP is on the blocklist. Classification is a pure
//! function of the record and one blocklist snapshot.

use netwarden_blocklist::BlocklistSnapshot;
use netwarden_core::{ClassifiedConnection, ConnectionRecord, DetectionConfig};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Process-name substrings of remote-access, tunneling, mining and shell tools
pub const SUSPICIOUS_KEYWORDS: [&str; 10] = [
    "minerd", "xmrig", "tor", "ngrok", "ssh", "perl", "sh", "bash", "nc", "netcat",
];

/// Remote ports associated with backdoors, IRC botnets and remote administration
pub const SUSPICIOUS_PORTS: [u16; 6] = [22, 23, 31337, 6667, 4444, 5555];

/// Which rule flagged a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "detail", rename_all = "snake_case")]
pub enum Indicator {
    /// Process name contains a suspicious keyword
    ProcessKeyword(String),
    /// Remote port is in the suspicious port set
    RemotePort(u16),
    /// Local IP is on the blocklist
    BlocklistedLocal(String),
    /// Remote IP is on the blocklist
    BlocklistedRemote(String),
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::ProcessKeyword(kw) => write!(f, "process name matches '{}'", kw),
            Indicator::RemotePort(port) => write!(f, "remote port {}", port),
            Indicator::BlocklistedLocal(ip) => write!(f, "local IP {} is blocklisted", ip),
            Indicator::BlocklistedRemote(ip) => write!(f, "remote IP {} is blocklisted", ip),
        }
    }
}

/// Heuristic and blocklist classifier
#[derive(Debug, Clone)]
pub struct ThreatClassifier {
    keywords: Vec<String>,
    ports: BTreeSet<u16>,
}

impl ThreatClassifier {
    /// Classifier with the built-in keyword and port sets
    pub fn new() -> Self {
        Self {
            keywords: SUSPICIOUS_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            ports: SUSPICIOUS_PORTS.into_iter().collect(),
        }
    }

    /// Built-in sets extended with configured entries
    pub fn from_config(config: &DetectionConfig) -> Self {
        let mut classifier = Self::new();
        for keyword in &config.extra_keywords {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && !classifier.keywords.contains(&keyword) {
                classifier.keywords.push(keyword);
            }
        }
        classifier.ports.extend(config.extra_ports.iter().copied());
        classifier
    }

    /// Whether `record` is suspicious against `blocklist`
    pub fn classify(&self, record: &ConnectionRecord, blocklist: &BlocklistSnapshot) -> bool {
        self.first_indicator(record, blocklist).is_some()
    }

    /// The first rule that matches, checking cheap rules first
    pub fn first_indicator(
        &self,
        record: &ConnectionRecord,
        blocklist: &BlocklistSnapshot,
    ) -> Option<Indicator> {
        self.keyword_indicator(record)
            .or_else(|| self.port_indicator(record))
            .or_else(|| local_blocklist_indicator(record, blocklist))
            .or_else(|| remote_blocklist_indicator(record, blocklist))
    }

    /// Every rule that matches
    pub fn indicators(
        &self,
        record: &ConnectionRecord,
        blocklist: &BlocklistSnapshot,
    ) -> Vec<Indicator> {
        [
            self.keyword_indicator(record),
            self.port_indicator(record),
            local_blocklist_indicator(record, blocklist),
            remote_blocklist_indicator(record, blocklist),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Attach verdicts to a batch of records using one snapshot
    pub fn classify_all(
        &self,
        records: Vec<ConnectionRecord>,
        blocklist: &BlocklistSnapshot,
    ) -> Vec<ClassifiedConnection> {
        records
            .into_iter()
            .map(|record| {
                let suspicious = self.classify(&record, blocklist);
                ClassifiedConnection { record, suspicious }
            })
            .collect()
    }

    fn keyword_indicator(&self, record: &ConnectionRecord) -> Option<Indicator> {
        let name = record.process_name.to_lowercase();
        self.keywords
            .iter()
            .find(|kw| name.contains(kw.as_str()))
            .map(|kw| Indicator::ProcessKeyword(kw.clone()))
    }

    fn port_indicator(&self, record: &ConnectionRecord) -> Option<Indicator> {
        record
            .remote
            .port()
            .filter(|port| self.ports.contains(port))
            .map(Indicator::RemotePort)
    }
}

impl Default for ThreatClassifier {
    fn default() -> Self {
        Self::new()
    }
}

// Local addresses are checked too; a local bind matching a blocklisted
// address is rare but kept as a signal.
fn local_blocklist_indicator(
    record: &ConnectionRecord,
    blocklist: &BlocklistSnapshot,
) -> Option<Indicator> {
    record
        .local
        .ip()
        .filter(|ip| blocklist.contains(ip))
        .map(Indicator::BlocklistedLocal)
}

fn remote_blocklist_indicator(
    record: &ConnectionRecord,
    blocklist: &BlocklistSnapshot,
) -> Option<Indicator> {
    record
        .remote
        .ip()
        .filter(|ip| blocklist.contains(ip))
        .map(Indicator::BlocklistedRemote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwarden_core::{AddressFamily, Endpoint, Protocol};

    fn record(process: &str, local: &str, remote: &str) -> ConnectionRecord {
        ConnectionRecord {
            pid: Some(4242),
            process_name: process.to_string(),
            protocol: Protocol::Tcp,
            local: Endpoint::parse(local),
            remote: Endpoint::parse(remote),
            status: "ESTABLISHED".to_string(),
            family: AddressFamily::IPv4,
        }
    }

    fn blocklist(text: &str) -> BlocklistSnapshot {
        BlocklistSnapshot::parse(text, 10)
    }

    #[test]
    fn test_keyword_rule() {
        let classifier = ThreatClassifier::new();
        let empty = BlocklistSnapshot::empty();

        let miner = record("xmrig-miner", "10.0.0.2:50000", "93.184.216.34:443");
        assert!(classifier.classify(&miner, &empty));
        assert_eq!(
            classifier.first_indicator(&miner, &empty),
            Some(Indicator::ProcessKeyword("xmrig".to_string()))
        );

        let upper = record("NGROK.exe", "10.0.0.2:50000", "93.184.216.34:443");
        assert!(classifier.classify(&upper, &empty));

        let benign = record("firefox", "10.0.0.2:50000", "93.184.216.34:443");
        assert!(!classifier.classify(&benign, &empty));
    }

    #[test]
    fn test_port_rule_ignores_name_and_blocklist() {
        let classifier = ThreatClassifier::new();
        let empty = BlocklistSnapshot::empty();

        for port in SUSPICIOUS_PORTS {
            let conn = record("firefox", "10.0.0.2:50000", &format!("93.184.216.34:{}", port));
            assert!(classifier.classify(&conn, &empty), "port {}", port);
        }

        // Only the remote port counts
        let local_only = record("firefox", "10.0.0.2:4444", "93.184.216.34:443");
        assert!(!classifier.classify(&local_only, &empty));
    }

    #[test]
    fn test_blocklist_rule_on_either_endpoint() {
        let classifier = ThreatClassifier::new();
        let snapshot = blocklist("93.184.216.34\n10.9.9.9\n");

        let remote_hit = record("firefox", "10.0.0.2:50000", "93.184.216.34:443");
        assert_eq!(
            classifier.first_indicator(&remote_hit, &snapshot),
            Some(Indicator::BlocklistedRemote("93.184.216.34".to_string()))
        );

        let local_hit = record("firefox", "10.9.9.9:50000", "1.1.1.1:443");
        assert_eq!(
            classifier.first_indicator(&local_hit, &snapshot),
            Some(Indicator::BlocklistedLocal("10.9.9.9".to_string()))
        );

        let miss = record("firefox", "10.0.0.2:50000", "1.1.1.1:443");
        assert!(!classifier.classify(&miss, &snapshot));
    }

    #[test]
    fn test_absent_endpoints_never_match() {
        let classifier = ThreatClassifier::new();
        let snapshot = blocklist("N/A\n");

        let listener = record("nginx", "0.0.0.0:80", "N/A");
        assert!(!classifier.classify(&listener, &snapshot));
    }

    #[test]
    fn test_ipv6_blocklist_match() {
        let classifier = ThreatClassifier::new();
        let snapshot = blocklist("2001:db8::dead\n");

        let conn = record("curl", "[2001:db8::1]:50000", "[2001:db8::dead]:443");
        assert!(classifier.classify(&conn, &snapshot));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = ThreatClassifier::new();
        let snapshot = blocklist("5.6.7.8\n");
        let records = [
            record("bash", "10.0.0.2:1", "5.6.7.8:80"),
            record("firefox", "10.0.0.2:1", "1.1.1.1:443"),
            record("curl", "10.0.0.2:1", "5.6.7.8:80"),
        ];

        for r in &records {
            assert_eq!(classifier.classify(r, &snapshot), classifier.classify(r, &snapshot));
            assert_eq!(
                classifier.classify(r, &snapshot),
                !classifier.indicators(r, &snapshot).is_empty()
            );
        }
    }

    #[test]
    fn test_all_indicators_reported() {
        let classifier = ThreatClassifier::new();
        let snapshot = blocklist("5.6.7.8\n");
        let conn = record("netcat", "10.0.0.2:1", "5.6.7.8:4444");

        let indicators = classifier.indicators(&conn, &snapshot);
        assert_eq!(indicators.len(), 3);
        assert_eq!(indicators[1], Indicator::RemotePort(4444));
    }

    #[test]
    fn test_config_extends_builtin_sets() {
        let config = DetectionConfig {
            extra_keywords: vec!["  Cobalt ".to_string()],
            extra_ports: vec![8081],
        };
        let classifier = ThreatClassifier::from_config(&config);
        let empty = BlocklistSnapshot::empty();

        assert!(classifier.classify(&record("cobaltstrike", "10.0.0.2:1", "1.1.1.1:443"), &empty));
        assert!(classifier.classify(&record("firefox", "10.0.0.2:1", "1.1.1.1:8081"), &empty));
        assert!(classifier.classify(&record("xmrig", "10.0.0.2:1", "1.1.1.1:443"), &empty));
    }

    #[test]
    fn test_classify_all_attaches_verdicts() {
        let classifier = ThreatClassifier::new();
        let snapshot = BlocklistSnapshot::empty();
        let classified = classifier.classify_all(
            vec![
                record("perl", "10.0.0.2:1", "1.1.1.1:443"),
                record("firefox", "10.0.0.2:1", "1.1.1.1:443"),
            ],
            &snapshot,
        );

        assert!(classified[0].suspicious);
        assert!(!classified[1].suspicious);
    }
}
