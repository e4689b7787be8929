//! Ownership and atomic replacement of the current blocklist

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{info, warn};

use crate::error::{RefreshError, RefreshResult};
use crate::fetch::BlocklistFetcher;
use crate::snapshot::BlocklistSnapshot;

/// Outcome history of loads and refreshes
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshStatus {
    /// Last time a snapshot was published
    pub last_success: Option<DateTime<Utc>>,
    /// Last time a load or refresh was attempted
    pub last_attempt: Option<DateTime<Utc>>,
    /// Message of the most recent failure, cleared on success
    pub last_error: Option<String>,
    /// Number of successful loads and refreshes
    pub successes: u64,
    /// Number of failed loads and refreshes
    pub failures: u64,
}

/// Owns the current [`BlocklistSnapshot`].
///
/// Writers build a complete snapshot before publishing it; publishing swaps
/// one `Arc` under a write lock that is held only for the swap. Readers clone
/// the `Arc` and keep using that snapshot for as long as they need it.
///
/// Reloads and remote refreshes are serialized by a writer lock held from the
/// read or fetch through the publish, so the published snapshot always
/// matches the last file written. Readers never take that lock.
pub struct BlocklistManager {
    current: RwLock<Arc<BlocklistSnapshot>>,
    writer: Mutex<()>,
    status: Mutex<RefreshStatus>,
    path: PathBuf,
    sample_size: usize,
}

impl BlocklistManager {
    /// Create a manager backed by the local file at `path`, starting empty
    pub fn new(path: impl Into<PathBuf>, sample_size: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(BlocklistSnapshot::empty())),
            writer: Mutex::new(()),
            status: Mutex::new(RefreshStatus::default()),
            path: path.into(),
            sample_size,
        }
    }

    /// Local file backing this manager
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The live snapshot. Never waits for a refresh in progress.
    pub fn current(&self) -> Arc<BlocklistSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Load and refresh history
    pub fn status(&self) -> RefreshStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-read the local file and publish it. Returns the new entry count.
    pub fn reload(&self) -> RefreshResult<usize> {
        let path = self.path.clone();
        self.reload_from(&path)
    }

    /// Read `path` and publish it as the current snapshot.
    ///
    /// On failure the current snapshot is left untouched.
    pub fn reload_from(&self, path: &Path) -> RefreshResult<usize> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let result = fs::read_to_string(path)
            .map_err(|e| RefreshError::io(path, e))
            .map(|text| {
                BlocklistSnapshot::parse(&text, self.sample_size)
                    .with_origin(path.display().to_string())
            });

        match result {
            Ok(snapshot) => {
                let count = self.publish(snapshot);
                info!("{} malicious IPs loaded from {}", count, path.display());
                Ok(count)
            }
            Err(e) => {
                warn!("Blocklist reload failed: {}", e);
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// Fetch `url`, persist it to the local file, and publish it.
    ///
    /// Any failure (network, empty document, local I/O) keeps the previous
    /// snapshot and is recorded in [`RefreshStatus`].
    pub fn refresh_from_remote(
        &self,
        fetcher: &dyn BlocklistFetcher,
        url: &str,
    ) -> RefreshResult<usize> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        info!("Refreshing blocklist from {}", url);

        match self.fetch_and_store(fetcher, url) {
            Ok(snapshot) => {
                let count = self.publish(snapshot);
                info!("{} malicious IPs loaded from {}", count, url);
                Ok(count)
            }
            Err(e) => {
                warn!("Blocklist refresh failed, keeping previous list: {}", e);
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    fn fetch_and_store(
        &self,
        fetcher: &dyn BlocklistFetcher,
        url: &str,
    ) -> RefreshResult<BlocklistSnapshot> {
        let body = fetcher.fetch(url)?;

        let snapshot = BlocklistSnapshot::parse(&body, self.sample_size).with_origin(url);
        if snapshot.is_empty() {
            return Err(RefreshError::Empty(url.to_string()));
        }

        write_atomically(&self.path, body.as_bytes())?;
        Ok(snapshot)
    }

    fn publish(&self, snapshot: BlocklistSnapshot) -> usize {
        let count = snapshot.count();
        let snapshot = Arc::new(snapshot);

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot;

        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        status.last_attempt = Some(now);
        status.last_success = Some(now);
        status.last_error = None;
        status.successes += 1;

        count
    }

    fn record_failure(&self, error: &RefreshError) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        status.last_attempt = Some(Utc::now());
        status.last_error = Some(error.to_string());
        status.failures += 1;
    }
}

/// Replace `path` via a sibling temp file so readers never see a partial file
fn write_atomically(path: &Path, contents: &[u8]) -> RefreshResult<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents).map_err(|e| RefreshError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        RefreshError::io(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HttpFetcher;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    struct StaticFetcher(&'static str);

    impl BlocklistFetcher for StaticFetcher {
        fn fetch(&self, _url: &str) -> RefreshResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingFetcher;

    impl BlocklistFetcher for FailingFetcher {
        fn fetch(&self, url: &str) -> RefreshResult<String> {
            Err(RefreshError::Network {
                url: url.to_string(),
                message: "connection reset by peer".to_string(),
            })
        }
    }

    /// Blocks inside `fetch` until the test releases it
    struct GatedFetcher {
        started: Arc<Barrier>,
        release: Arc<Barrier>,
        body: &'static str,
    }

    impl BlocklistFetcher for GatedFetcher {
        fn fetch(&self, _url: &str) -> RefreshResult<String> {
            self.started.wait();
            self.release.wait();
            Ok(self.body.to_string())
        }
    }

    fn manager_with(contents: &str) -> (tempfile::TempDir, BlocklistManager) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full-aa.txt");
        fs::write(&path, contents).unwrap();
        let manager = BlocklistManager::new(path, 10);
        (dir, manager)
    }

    #[test]
    fn test_reload_scenario() {
        let (_dir, manager) = manager_with("1.2.3.4\n#comment\n\n5.6.7.8\n");
        assert_eq!(manager.current().count(), 0);

        assert_eq!(manager.reload().unwrap(), 2);

        let snapshot = manager.current();
        assert_eq!(snapshot.sorted_ips(), vec!["1.2.3.4", "5.6.7.8"]);
        assert_eq!(manager.status().successes, 1);
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let (dir, manager) = manager_with("1.2.3.4\n");
        manager.reload().unwrap();
        let before = manager.current();

        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            manager.reload_from(&missing),
            Err(RefreshError::Io { .. })
        ));

        assert!(Arc::ptr_eq(&before, &manager.current()));
        let status = manager.status();
        assert_eq!(status.failures, 1);
        assert!(status.last_error.is_some());
    }

    #[test]
    fn test_remote_refresh_writes_file_and_publishes() {
        let (_dir, manager) = manager_with("1.2.3.4\n");
        manager.reload().unwrap();

        let count = manager
            .refresh_from_remote(&StaticFetcher("9.9.9.9\n8.8.4.4\n# feed\n"), "https://feed")
            .unwrap();
        assert_eq!(count, 2);

        let snapshot = manager.current();
        assert!(snapshot.contains("9.9.9.9"));
        assert!(!snapshot.contains("1.2.3.4"));
        assert_eq!(snapshot.origin(), Some("https://feed"));

        let on_disk = fs::read_to_string(manager.path()).unwrap();
        assert!(on_disk.contains("8.8.4.4"));
    }

    #[test]
    fn test_remote_failure_keeps_previous_snapshot() {
        let (_dir, manager) = manager_with("1.2.3.4\n5.6.7.8\n");
        manager.reload().unwrap();
        let before = manager.current();

        let result = manager.refresh_from_remote(&FailingFetcher, "https://feed");
        assert!(matches!(result, Err(RefreshError::Network { .. })));

        let after = manager.current();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.count(), 2);
        assert_eq!(
            fs::read_to_string(manager.path()).unwrap(),
            "1.2.3.4\n5.6.7.8\n"
        );
    }

    #[test]
    fn test_empty_remote_document_is_rejected() {
        let (_dir, manager) = manager_with("1.2.3.4\n");
        manager.reload().unwrap();

        let result = manager.refresh_from_remote(&StaticFetcher("# nothing\n\n"), "https://feed");
        assert!(matches!(result, Err(RefreshError::Empty(_))));
        assert!(manager.current().contains("1.2.3.4"));
    }

    #[test]
    fn test_unreachable_remote_keeps_previous_snapshot() {
        let (_dir, manager) = manager_with("1.2.3.4\n");
        manager.reload().unwrap();
        let before = manager.current();

        // Port 1 on loopback is closed, so the connection is refused at once
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        assert!(manager
            .refresh_from_remote(&fetcher, "http://127.0.0.1:1/full-aa.txt")
            .is_err());

        assert!(Arc::ptr_eq(&before, &manager.current()));
    }

    #[test]
    fn test_readers_see_whole_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let old_path = dir.path().join("old.txt");
        let new_path = dir.path().join("new.txt");
        let old: String = (0..500).map(|i| format!("10.0.{}.{}\n", i / 256, i % 256)).collect();
        let new: String = (0..800).map(|i| format!("172.16.{}.{}\n", i / 256, i % 256)).collect();
        fs::write(&old_path, old).unwrap();
        fs::write(&new_path, new).unwrap();

        let manager = Arc::new(BlocklistManager::new(&old_path, 10));
        manager.reload().unwrap();

        let writer = {
            let manager = manager.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    let path = if i % 2 == 0 { &new_path } else { &old_path };
                    manager.reload_from(path).unwrap();
                }
            })
        };

        for _ in 0..2000 {
            let snapshot = manager.current();
            let count = snapshot.count();
            assert!(count == 500 || count == 800);
            let mixed = snapshot.contains("10.0.0.1") && snapshot.contains("172.16.0.1");
            assert!(!mixed);
        }

        writer.join().unwrap();
    }

    #[test]
    fn test_reload_waits_for_refresh_in_progress() {
        let (_dir, manager) = manager_with("1.1.1.1\n");
        let manager = Arc::new(manager);
        manager.reload().unwrap();

        let started = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let fetcher = GatedFetcher {
            started: started.clone(),
            release: release.clone(),
            body: "2.2.2.2\n3.3.3.3\n",
        };

        let refresh = {
            let manager = manager.clone();
            thread::spawn(move || manager.refresh_from_remote(&fetcher, "https://feed"))
        };
        started.wait();

        let reload = {
            let manager = manager.clone();
            thread::spawn(move || manager.reload())
        };
        thread::sleep(Duration::from_millis(100));

        assert!(!reload.is_finished());
        assert_eq!(manager.current().count(), 1);

        release.wait();
        assert_eq!(refresh.join().unwrap().unwrap(), 2);
        assert_eq!(reload.join().unwrap().unwrap(), 2);

        let snapshot = manager.current();
        assert!(snapshot.contains("2.2.2.2"));
        assert!(!snapshot.contains("1.1.1.1"));
    }
}
