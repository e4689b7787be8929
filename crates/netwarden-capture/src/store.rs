//! On-disk capture store

use chrono::{Local, NaiveDateTime};
use netwarden_core::ConnectionRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{CaptureError, CaptureResult};

const PREFIX: &str = "capture-";
const EXTENSION: &str = ".json";
const STAGING_PREFIX: &str = ".staging-";

/// File name for a capture created at `at`
pub fn capture_filename(at: NaiveDateTime) -> String {
    format!("{}{}{}", PREFIX, at.format("%Y%m%d-%H%M%S"), EXTENSION)
}

/// Directory of write-once capture files
#[derive(Debug, Clone)]
pub struct CaptureStore {
    dir: PathBuf,
}

impl CaptureStore {
    /// Open the store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> CaptureResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the captures
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `records` to a new capture named after the current local time.
    ///
    /// Two saves within the same second map to the same name; the second
    /// fails with [`CaptureError::AlreadyExists`] rather than overwriting.
    pub fn save<T: Serialize>(&self, records: &[T]) -> CaptureResult<String> {
        self.save_at(records, Local::now().naive_local())
    }

    fn save_at<T: Serialize>(&self, records: &[T], at: NaiveDateTime) -> CaptureResult<String> {
        let name = capture_filename(at);
        let contents = serde_json::to_vec_pretty(records)?;

        // Staged beside the final name; dropped (and removed) on any error
        let mut staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(EXTENSION)
            .tempfile_in(&self.dir)?;
        staged.write_all(&contents)?;
        staged.as_file().sync_all()?;

        staged
            .persist_noclobber(self.dir.join(&name))
            .map_err(|e| match e.error.kind() {
                ErrorKind::AlreadyExists => CaptureError::AlreadyExists(name.clone()),
                _ => CaptureError::Io(e.error),
            })?;

        info!("Saved {} records to capture {}", records.len(), name);
        Ok(name)
    }

    /// All capture names, most recent first
    pub fn list(&self) -> CaptureResult<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(PREFIX) && name.ends_with(EXTENSION) {
                names.push(name);
            }
        }

        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    /// Load a capture as connection records
    pub fn load(&self, name: &str) -> CaptureResult<Vec<ConnectionRecord>> {
        self.load_as(name)
    }

    /// Load a capture as any record shape
    pub fn load_as<T: DeserializeOwned>(&self, name: &str) -> CaptureResult<Vec<T>> {
        let path = self.resolve(name)?;

        let content = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CaptureError::NotFound(name.to_string()),
            _ => CaptureError::Io(e),
        })?;

        serde_json::from_slice(&content).map_err(|e| CaptureError::Parse {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    fn resolve(&self, name: &str) -> CaptureResult<PathBuf> {
        let is_plain = !name.is_empty()
            && !name.contains(['/', '\\'])
            && name != "."
            && name != ".."
            && Path::new(name).file_name().map(|n| n == name).unwrap_or(false);

        if !is_plain {
            return Err(CaptureError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }
}
