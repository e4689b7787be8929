//! The monitoring facade

use chrono::{DateTime, Utc};
use netwarden_blocklist::{BlocklistFetcher, BlocklistManager, RefreshResult, RefreshSchedule};
use netwarden_capture::{CaptureResult, CaptureStore};
use netwarden_core::{ClassifiedConnection, Config, ConnectionRecord, NetWardenError, Result};
use netwarden_detect::{Indicator, ThreatClassifier};
use netwarden_procmon::ConnectionEnumerator;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Blocklist summary for display
#[derive(Debug, Clone, Serialize)]
pub struct BlocklistInfo {
    /// Number of blocked addresses
    pub count: usize,
    /// Blocked addresses in sorted order (empty unless requested)
    pub ips: Vec<String>,
    /// Most recently added entries
    pub last_added: Vec<String>,
    /// When the current list was loaded
    pub loaded_at: Option<DateTime<Utc>>,
    /// File or URL the current list came from
    pub origin: Option<String>,
    /// Most recent load/refresh failure, if the last attempt failed
    pub last_error: Option<String>,
}

/// Result of a forced reload
#[derive(Debug, Clone, Serialize)]
pub struct ReloadOutcome {
    /// `success` or `error`
    pub status: &'static str,
    /// Entry count of the list in force afterwards
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A classified connection with the rules that flagged it
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    #[serde(flatten)]
    pub connection: ClassifiedConnection,
    pub indicators: Vec<Indicator>,
}

/// Connection monitor: the engine behind every control-surface operation.
///
/// Safe to share between threads; the blocklist is the only mutable state and
/// is swapped atomically by its manager.
pub struct Monitor {
    enumerator: ConnectionEnumerator,
    classifier: ThreatClassifier,
    blocklist: Arc<BlocklistManager>,
    captures: CaptureStore,
}

impl Monitor {
    /// Assemble a monitor from its parts
    pub fn new(
        enumerator: ConnectionEnumerator,
        classifier: ThreatClassifier,
        blocklist: Arc<BlocklistManager>,
        captures: CaptureStore,
    ) -> Self {
        Self {
            enumerator,
            classifier,
            blocklist,
            captures,
        }
    }

    /// Build a monitor from configuration and load the local blocklist.
    ///
    /// A missing or unreadable blocklist file is not fatal; the monitor
    /// starts with an empty list.
    pub fn from_config(config: &Config) -> Result<Self> {
        let captures = CaptureStore::open(&config.capture.directory).map_err(|e| {
            NetWardenError::Config(format!(
                "cannot open capture directory {}: {}",
                config.capture.directory.display(),
                e
            ))
        })?;

        let blocklist = Arc::new(BlocklistManager::new(
            &config.blocklist.path,
            config.blocklist.sample_size,
        ));
        if blocklist.reload().is_err() {
            warn!(
                "Starting with an empty blocklist; {} could not be loaded",
                config.blocklist.path.display()
            );
        }

        Ok(Self::new(
            ConnectionEnumerator::from_config(&config.procmon),
            ThreatClassifier::from_config(&config.detection),
            blocklist,
            captures,
        ))
    }

    /// The blocklist manager
    pub fn blocklist(&self) -> &Arc<BlocklistManager> {
        &self.blocklist
    }

    /// The capture store
    pub fn captures(&self) -> &CaptureStore {
        &self.captures
    }

    /// All current connections with verdicts attached
    pub fn connections(&self) -> Result<Vec<ClassifiedConnection>> {
        let records = self.enumerator.enumerate()?;
        Ok(self.classify(records))
    }

    /// Only the suspicious current connections
    pub fn suspicious_connections(&self) -> Result<Vec<ClassifiedConnection>> {
        Ok(self
            .connections()?
            .into_iter()
            .filter(|c| c.suspicious)
            .collect())
    }

    /// Suspicious current connections with the rules that matched
    pub fn alerts(&self) -> Result<Vec<Alert>> {
        let records = self.enumerator.enumerate()?;
        let snapshot = self.blocklist.current();

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let indicators = self.classifier.indicators(&record, &snapshot);
                (!indicators.is_empty()).then(|| Alert {
                    connection: ClassifiedConnection {
                        record,
                        suspicious: true,
                    },
                    indicators,
                })
            })
            .collect())
    }

    /// Classify records against one blocklist snapshot
    pub fn classify(&self, records: Vec<ConnectionRecord>) -> Vec<ClassifiedConnection> {
        let snapshot = self.blocklist.current();
        self.classifier.classify_all(records, &snapshot)
    }

    /// Blocklist summary; the full address list only when `include_ips`
    pub fn blocklist_info(&self, include_ips: bool) -> BlocklistInfo {
        let snapshot = self.blocklist.current();
        let status = self.blocklist.status();

        BlocklistInfo {
            count: snapshot.count(),
            ips: if include_ips {
                snapshot.sorted_ips().into_iter().map(String::from).collect()
            } else {
                Vec::new()
            },
            last_added: snapshot.last_added().to_vec(),
            loaded_at: snapshot.loaded_at(),
            origin: snapshot.origin().map(String::from),
            last_error: status.last_error,
        }
    }

    /// Re-read the local blocklist file now
    pub fn force_reload(&self) -> ReloadOutcome {
        match self.blocklist.reload() {
            Ok(count) => ReloadOutcome {
                status: "success",
                count,
                error: None,
            },
            Err(e) => ReloadOutcome {
                status: "error",
                count: self.blocklist.current().count(),
                error: Some(e.to_string()),
            },
        }
    }

    /// Fetch the remote blocklist now
    pub fn refresh_now(&self, fetcher: &dyn BlocklistFetcher, url: &str) -> RefreshResult<usize> {
        self.blocklist.refresh_from_remote(fetcher, url)
    }

    /// Start the background refresh schedule
    pub fn start_refresh(
        &self,
        fetcher: Arc<dyn BlocklistFetcher>,
        url: impl Into<String>,
        interval: Duration,
        run_immediately: bool,
    ) -> std::io::Result<RefreshSchedule> {
        let url = url.into();
        info!("Starting blocklist refresh from {}", url);
        RefreshSchedule::spawn(
            self.blocklist.clone(),
            fetcher,
            url,
            interval,
            run_immediately,
        )
    }

    /// Persist records as a new capture
    pub fn save_capture<T: Serialize>(&self, records: &[T]) -> CaptureResult<String> {
        self.captures.save(records)
    }

    /// Capture names, most recent first
    pub fn list_captures(&self) -> CaptureResult<Vec<String>> {
        self.captures.list()
    }

    /// Records stored in a capture
    pub fn load_capture(&self, name: &str) -> CaptureResult<Vec<ConnectionRecord>> {
        self.captures.load(name)
    }

    /// Re-classify a stored capture against the current blocklist
    pub fn review_capture(&self, name: &str) -> CaptureResult<Vec<ClassifiedConnection>> {
        let records = self.captures.load(name)?;
        Ok(self.classify(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwarden_capture::CaptureError;
    use netwarden_core::{AddressFamily, NameResolver, Protocol, RawSocket, SocketSource};
    use std::fs;

    struct FixedSource(Vec<RawSocket>);

    impl SocketSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        fn sockets(&self) -> Result<Vec<RawSocket>> {
            Ok(self.0.clone())
        }
    }

    struct DeniedSource;

    impl SocketSource for DeniedSource {
        fn name(&self) -> &str {
            "denied"
        }

        fn sockets(&self) -> Result<Vec<RawSocket>> {
            Err(NetWardenError::PermissionDenied("socket table".into()))
        }
    }

    struct PidNames;

    impl NameResolver for PidNames {
        fn resolve(&self, pid: Option<u32>) -> String {
            match pid {
                Some(1) => "firefox".to_string(),
                Some(2) => "xmrig".to_string(),
                Some(pid) => format!("[PID {} - inaccessible]", pid),
                None => "System".to_string(),
            }
        }
    }

    fn tcp(pid: u32, local: &str, remote: &str) -> RawSocket {
        RawSocket {
            protocol: Protocol::Tcp,
            family: AddressFamily::IPv4,
            local: Some(local.parse().unwrap()),
            remote: Some(remote.parse().unwrap()),
            state: Some("ESTABLISHED".to_string()),
            pid: Some(pid),
        }
    }

    fn monitor(source: Box<dyn SocketSource>) -> (tempfile::TempDir, Monitor) {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("full-aa.txt");
        fs::write(&list, "203.0.113.9\n# feed\n").unwrap();

        let blocklist = Arc::new(BlocklistManager::new(&list, 10));
        blocklist.reload().unwrap();

        let monitor = Monitor::new(
            ConnectionEnumerator::with_parts(source, Box::new(PidNames)),
            ThreatClassifier::new(),
            blocklist,
            CaptureStore::open(dir.path().join("captures")).unwrap(),
        );
        (dir, monitor)
    }

    fn sample() -> Box<dyn SocketSource> {
        Box::new(FixedSource(vec![
            tcp(1, "10.0.0.2:50000", "93.184.216.34:443"),
            tcp(2, "10.0.0.2:50001", "93.184.216.34:443"),
            tcp(1, "10.0.0.2:50002", "203.0.113.9:443"),
            tcp(1, "10.0.0.2:50003", "198.51.100.7:6667"),
        ]))
    }

    #[test]
    fn test_connections_and_alerts() {
        let (_dir, monitor) = monitor(sample());

        let all = monitor.connections().unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(
            all.iter().map(|c| c.suspicious).collect::<Vec<_>>(),
            vec![false, true, true, true]
        );

        let suspicious = monitor.suspicious_connections().unwrap();
        assert_eq!(suspicious.len(), 3);

        let alerts = monitor.alerts().unwrap();
        assert_eq!(alerts.len(), 3);
        assert_eq!(
            alerts[1].indicators,
            vec![Indicator::BlocklistedRemote("203.0.113.9".to_string())]
        );
    }

    #[test]
    fn test_permission_denied_reaches_caller() {
        let (_dir, monitor) = monitor(Box::new(DeniedSource));
        assert!(monitor.connections().unwrap_err().is_permission_denied());
        assert!(monitor.suspicious_connections().is_err());
    }

    #[test]
    fn test_blocklist_info_and_reload() {
        let (_dir, monitor) = monitor(sample());

        let info = monitor.blocklist_info(true);
        assert_eq!(info.count, 1);
        assert_eq!(info.ips, vec!["203.0.113.9"]);
        assert_eq!(info.last_added, vec!["203.0.113.9"]);
        assert!(info.last_error.is_none());
        assert!(monitor.blocklist_info(false).ips.is_empty());

        fs::write(monitor.blocklist().path(), "1.1.1.1\n2.2.2.2\n").unwrap();
        let outcome = monitor.force_reload();
        assert_eq!(outcome.status, "success");
        assert_eq!(outcome.count, 2);

        fs::remove_file(monitor.blocklist().path()).unwrap();
        let outcome = monitor.force_reload();
        assert_eq!(outcome.status, "error");
        assert_eq!(outcome.count, 2);
        assert!(outcome.error.is_some());
        assert!(monitor.blocklist_info(false).last_error.is_some());
    }

    #[test]
    fn test_capture_flow() {
        let (_dir, monitor) = monitor(sample());

        let connections = monitor.connections().unwrap();
        let name = monitor.save_capture(&connections).unwrap();
        assert_eq!(monitor.list_captures().unwrap(), vec![name.clone()]);

        let stored = monitor.load_capture(&name).unwrap();
        let expected: Vec<ConnectionRecord> =
            connections.iter().map(|c| c.record.clone()).collect();
        assert_eq!(stored, expected);

        let reviewed = monitor.review_capture(&name).unwrap();
        assert_eq!(reviewed, connections);

        assert!(matches!(
            monitor.load_capture("missing.json"),
            Err(CaptureError::NotFound(_))
        ));
    }

    #[test]
    fn test_from_config_tolerates_missing_blocklist() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.blocklist.path = dir.path().join("absent.txt");
        config.capture.directory = dir.path().join("captures");

        let monitor = Monitor::from_config(&config).unwrap();
        assert_eq!(monitor.blocklist_info(false).count, 0);
        assert!(monitor.captures().dir().exists());
    }
}
