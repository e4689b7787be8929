//! Capture storage for netwarden
//!
//! A capture is a write-once JSON array of connection records, stored as
//! `capture-<YYYYMMDD>-<HHMMSS>.json` in the capture directory. Names sort
//! lexicographically by creation time.

pub mod error;
pub mod store;

pub use error::{CaptureError, CaptureResult};
pub use store::{capture_filename, CaptureStore};
