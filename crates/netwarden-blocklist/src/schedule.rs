//! Background refresh schedule

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

use crate::fetch::BlocklistFetcher;
use crate::manager::BlocklistManager;

/// A worker thread that refreshes the blocklist on a fixed interval.
///
/// Stopping (explicitly or on drop) wakes the worker at once and joins it.
/// A refresh already in flight is allowed to finish, so the stop never
/// leaves a partially applied update behind.
pub struct RefreshSchedule {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl RefreshSchedule {
    /// Start refreshing `manager` from `url` every `interval`.
    ///
    /// With `run_immediately` the first refresh happens right away instead
    /// of after the first interval.
    pub fn spawn(
        manager: Arc<BlocklistManager>,
        fetcher: Arc<dyn BlocklistFetcher>,
        url: String,
        interval: Duration,
        run_immediately: bool,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let worker = thread::Builder::new()
            .name("blocklist-refresh".to_string())
            .spawn(move || {
                info!(
                    "Blocklist refresh scheduled every {}s from {}",
                    interval.as_secs(),
                    url
                );

                if run_immediately {
                    // Failures are logged and recorded by the manager
                    let _ = manager.refresh_from_remote(fetcher.as_ref(), &url);
                }

                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let _ = manager.refresh_from_remote(fetcher.as_ref(), &url);
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                debug!("Blocklist refresh schedule stopped");
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            worker: Some(worker),
        })
    }

    /// Whether the worker thread is still alive
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|worker| !worker.is_finished())
            .unwrap_or(false)
    }

    /// Stop the schedule and wait for the worker to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for RefreshSchedule {
    fn drop(&mut self) {
        self.shutdown();
    }
}
