//! Configuration structures for netwarden

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default remote source of the malicious IP blocklist
pub const DEFAULT_BLOCKLIST_URL: &str =
    "https://raw.githubusercontent.com/romainmarcoux/malicious-ip/master/full-aa.txt";

/// Main configuration for netwarden
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Blocklist source and refresh settings
    #[serde(default)]
    pub blocklist: BlocklistConfig,

    /// Capture storage settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Heuristic detection settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Connection enumeration settings
    #[serde(default)]
    pub procmon: ProcmonConfig,
}

/// General configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Output format (text, json)
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            output_format: default_output_format(),
        }
    }
}

fn default_output_format() -> String {
    "text".to_string()
}

/// Blocklist configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlocklistConfig {
    /// Local file holding one IP address per line
    #[serde(default = "default_blocklist_path")]
    pub path: PathBuf,

    /// Remote document the local file is refreshed from
    #[serde(default = "default_blocklist_url")]
    pub url: String,

    /// Seconds between scheduled remote refreshes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Timeout for a single remote fetch
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Number of most recently added entries kept for display
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Fetch immediately when the schedule starts instead of after one interval
    #[serde(default = "default_true")]
    pub refresh_on_start: bool,
}

impl Default for BlocklistConfig {
    fn default() -> Self {
        Self {
            path: default_blocklist_path(),
            url: default_blocklist_url(),
            refresh_interval_secs: default_refresh_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            sample_size: default_sample_size(),
            refresh_on_start: true,
        }
    }
}

fn default_blocklist_path() -> PathBuf {
    PathBuf::from("full-aa.txt")
}

fn default_blocklist_url() -> String {
    DEFAULT_BLOCKLIST_URL.to_string()
}

fn default_refresh_interval() -> u64 {
    3600
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_sample_size() -> usize {
    10
}

/// Capture storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Directory holding capture files
    #[serde(default = "default_capture_dir")]
    pub directory: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            directory: default_capture_dir(),
        }
    }
}

fn default_capture_dir() -> PathBuf {
    PathBuf::from("captures")
}

/// Heuristic detection configuration
///
/// Entries here extend the built-in keyword and port sets; they never
/// replace them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Additional process-name substrings to flag
    #[serde(default)]
    pub extra_keywords: Vec<String>,

    /// Additional remote ports to flag
    #[serde(default)]
    pub extra_ports: Vec<u16>,
}

/// Connection enumeration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcmonConfig {
    /// Root of the procfs mount (Linux only)
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
}

impl Default for ProcmonConfig {
    fn default() -> Self {
        Self {
            proc_root: default_proc_root(),
        }
    }
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;

        if path.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::from_str(&content).map_err(|e| crate::error::NetWardenError::Parse {
                context: path.display().to_string(),
                message: e.to_string(),
            })
        } else {
            // Assume YAML for other extensions
            serde_yaml::from_str(&content).map_err(|e| crate::error::NetWardenError::Parse {
                context: path.display().to_string(),
                message: e.to_string(),
            })
        }
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        let content = if path.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)
                .map_err(|e| crate::error::NetWardenError::Serialization(e.to_string()))?
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Refresh interval as a `Duration`
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.blocklist.refresh_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.blocklist.path, PathBuf::from("full-aa.txt"));
        assert_eq!(config.blocklist.refresh_interval_secs, 3600);
        assert_eq!(config.blocklist.sample_size, 10);
        assert_eq!(config.capture.directory, PathBuf::from("captures"));
        assert_eq!(config.general.output_format, "text");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netwarden.yaml");
        std::fs::write(
            &path,
            "blocklist:\n  refresh_interval_secs: 60\ndetection:\n  extra_ports: [8081]\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.blocklist.refresh_interval_secs, 60);
        assert_eq!(config.blocklist.url, DEFAULT_BLOCKLIST_URL);
        assert_eq!(config.detection.extra_ports, vec![8081]);
        assert_eq!(config.procmon.proc_root, PathBuf::from("/proc"));
    }

    #[test]
    fn test_json_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netwarden.json");

        let mut config = Config::default();
        config.capture.directory = PathBuf::from("/var/lib/netwarden");
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.capture.directory, PathBuf::from("/var/lib/netwarden"));
    }

    #[test]
    fn test_invalid_config_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(crate::error::NetWardenError::Parse { .. })
        ));
    }
}
