//! CLI command implementations

pub mod alerts;
pub mod blocklist;
pub mod capture;
pub mod connections;
pub mod info;
pub mod watch;

use anyhow::Context as _;
use netwarden_core::Config;
use netwarden_engine::{format_json, Monitor};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Settings shared by every command
pub struct Context {
    pub config: Config,
    pub format: String,
}

impl Context {
    /// Load the configuration file, then apply command-line overrides
    pub fn load(
        config_path: Option<&Path>,
        format: Option<&str>,
        blocklist: Option<PathBuf>,
        captures: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let mut config = match config_path {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(path) = blocklist {
            config.blocklist.path = path;
        }
        if let Some(dir) = captures {
            config.capture.directory = dir;
        }

        let format = format
            .map(str::to_string)
            .unwrap_or_else(|| config.general.output_format.clone());
        if format != "text" && format != "json" {
            anyhow::bail!("unknown output format '{}' (expected text or json)", format);
        }

        Ok(Self { config, format })
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }

    pub fn monitor(&self) -> anyhow::Result<Monitor> {
        Ok(Monitor::from_config(&self.config)?)
    }

    /// Print `value` as pretty JSON, or the text rendering otherwise
    pub fn emit<T: Serialize + ?Sized>(
        &self,
        value: &T,
        text: impl FnOnce(&T) -> String,
    ) -> anyhow::Result<()> {
        if self.is_json() {
            println!("{}", format_json(value, true)?);
        } else {
            println!("{}", text(value));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_apply_over_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netwarden.yaml");
        std::fs::write(
            &path,
            "general:\n  output_format: json\nblocklist:\n  path: /srv/list.txt\n",
        )
        .unwrap();

        let ctx = Context::load(Some(&path), None, None, Some(dir.path().join("caps"))).unwrap();
        assert!(ctx.is_json());
        assert_eq!(ctx.config.blocklist.path, PathBuf::from("/srv/list.txt"));
        assert_eq!(ctx.config.capture.directory, dir.path().join("caps"));

        let ctx = Context::load(Some(&path), Some("text"), Some("mine.txt".into()), None).unwrap();
        assert!(!ctx.is_json());
        assert_eq!(ctx.config.blocklist.path, PathBuf::from("mine.txt"));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Context::load(None, Some("xml"), None, None).is_err());
        assert!(Context::load(Some(Path::new("/nonexistent/netwarden.yaml")), None, None, None).is_err());
    }
}
