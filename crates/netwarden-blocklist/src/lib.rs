//! Malicious IP blocklist for netwarden
//!
//! The current blocklist is an immutable [`BlocklistSnapshot`] owned by a
//! [`BlocklistManager`]. Reloads and remote refreshes build a complete new
//! snapshot and swap it in one step, so readers always see either the old
//! set or the new one. A [`RefreshSchedule`] drives remote refreshes on a
//! fixed interval in the background.
//!
//! # Example
//!
//! ```no_run
//! use netwarden_blocklist::{BlocklistManager, HttpFetcher, RefreshSchedule};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let manager = Arc::new(BlocklistManager::new("full-aa.txt", 10));
//! manager.reload().ok();
//!
//! let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(30)).unwrap());
//! let schedule = RefreshSchedule::spawn(
//!     manager.clone(),
//!     fetcher,
//!     "https://example.org/blocklist.txt".to_string(),
//!     Duration::from_secs(3600),
//!     true,
//! )
//! .unwrap();
//!
//! let snapshot = manager.current();
//! println!("{} blocked addresses", snapshot.count());
//! schedule.stop();
//! ```

pub mod error;
pub mod fetch;
pub mod manager;
pub mod schedule;
pub mod snapshot;

pub use error::{RefreshError, RefreshResult};
pub use fetch::{BlocklistFetcher, HttpFetcher};
pub use manager::{BlocklistManager, RefreshStatus};
pub use schedule::RefreshSchedule;
pub use snapshot::BlocklistSnapshot;
