//! Platform layer for netwarden
//!
//! Provides OS detection and privilege checks used to explain what the
//! connection monitor can and cannot see.

mod detection;

pub use detection::*;

/// Host information shown by the `info` command
#[derive(Debug, Clone)]
pub struct SystemInfo {
    /// Operating system name
    pub os_name: String,
    /// Operating system version
    pub os_version: String,
    /// Hostname
    pub hostname: String,
    /// Architecture (x86_64, aarch64, etc.)
    pub architecture: String,
    /// Whether running with elevated privileges
    pub is_elevated: bool,
    /// Kernel version (if available)
    pub kernel_version: Option<String>,
}

/// Get system information
pub fn get_system_info() -> SystemInfo {
    let os_info = detect_os();

    SystemInfo {
        os_name: os_info.os_type.to_string(),
        os_version: os_info.version,
        hostname: sysinfo::System::host_name().unwrap_or_else(|| "unknown".to_string()),
        architecture: os_info.arch,
        is_elevated: is_elevated(),
        kernel_version: sysinfo::System::kernel_version(),
    }
}
