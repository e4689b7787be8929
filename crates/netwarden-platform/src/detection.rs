//! OS and privilege detection

use std::fmt;

/// Operating system information
#[derive(Debug, Clone)]
pub struct OsInfo {
    /// Operating system type
    pub os_type: OsType,
    /// OS version string
    pub version: String,
    /// Architecture
    pub arch: String,
    /// Distribution (for Linux)
    pub distribution: Option<String>,
}

/// Supported operating system types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsType {
    Linux,
    MacOS,
    Windows,
    Unknown,
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsType::Linux => write!(f, "Linux"),
            OsType::MacOS => write!(f, "macOS"),
            OsType::Windows => write!(f, "Windows"),
            OsType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Detect the current operating system
pub fn detect_os() -> OsInfo {
    OsInfo {
        os_type: detect_os_type(),
        version: sysinfo::System::os_version().unwrap_or_else(|| "unknown".to_string()),
        arch: std::env::consts::ARCH.to_string(),
        distribution: detect_distribution(),
    }
}

fn detect_os_type() -> OsType {
    match std::env::consts::OS {
        "linux" => OsType::Linux,
        "macos" => OsType::MacOS,
        "windows" => OsType::Windows,
        _ => OsType::Unknown,
    }
}

fn detect_distribution() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/etc/os-release").ok()?;
        parse_os_release(&content)
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Pick the distribution name out of an os-release document
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_os_release(content: &str) -> Option<String> {
    let field = |key: &str| {
        content
            .lines()
            .find_map(|line| line.strip_prefix(key))
            .map(|value| value.trim_matches('"').to_string())
    };

    field("PRETTY_NAME=").or_else(|| field("NAME="))
}

/// Check if running with elevated privileges
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        nix::unistd::geteuid().is_root()
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Remediation hint shown when the OS refuses to list sockets
pub fn elevation_hint() -> &'static str {
    if cfg!(windows) {
        "re-run from an Administrator prompt to see every process"
    } else {
        "re-run with elevated privileges (sudo) to see every process"
    }
}
