//! Output formatting for connection listings

use netwarden_core::{ClassifiedConnection, Endpoint, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write;

use crate::monitor::{Alert, BlocklistInfo};

/// Counts over a connection listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionSummary {
    pub total_connections: usize,
    pub suspicious: usize,
    pub listening: usize,
    pub established: usize,
    pub unique_remote_hosts: usize,
}

impl ConnectionSummary {
    pub fn from_connections(connections: &[ClassifiedConnection]) -> Self {
        let mut summary = Self {
            total_connections: connections.len(),
            ..Self::default()
        };

        let mut remote_hosts = HashSet::new();

        for conn in connections {
            if conn.suspicious {
                summary.suspicious += 1;
            }
            match conn.record.status.as_str() {
                "LISTEN" => summary.listening += 1,
                "ESTABLISHED" => summary.established += 1,
                _ => {}
            }
            if let Endpoint::Socket { ip, .. } = &conn.record.remote {
                remote_hosts.insert(*ip);
            }
        }

        summary.unique_remote_hosts = remote_hosts.len();
        summary
    }
}

/// Serialize any result as JSON
pub fn format_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Render connections as a table followed by a summary line
pub fn format_connections_text(connections: &[ClassifiedConnection]) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "  {:<7} {:<24} {:<5} {:<42} {:<42} {:<12} {}",
        "PID", "PROCESS", "PROTO", "LOCAL", "REMOTE", "STATUS", "FAMILY"
    );

    for conn in connections {
        let record = &conn.record;
        let pid = record
            .pid
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{} {:<7} {:<24} {:<5} {:<42} {:<42} {:<12} {}",
            if conn.suspicious { "!" } else { " " },
            pid,
            truncate(&record.process_name, 24),
            record.protocol.as_str(),
            record.local.to_string(),
            record.remote.to_string(),
            record.status,
            record.family.as_str(),
        );
    }

    let summary = ConnectionSummary::from_connections(connections);
    let _ = write!(
        out,
        "\n{} connections, {} suspicious, {} listening, {} established, {} remote hosts",
        summary.total_connections,
        summary.suspicious,
        summary.listening,
        summary.established,
        summary.unique_remote_hosts
    );

    out
}

/// Render alerts with the rules that flagged them
pub fn format_alerts_text(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "No suspicious connections.".to_string();
    }

    let mut out = String::new();
    for alert in alerts {
        let record = &alert.connection.record;
        let _ = writeln!(
            out,
            "[ALERT] {} (PID {}) {} {} -> {} [{}]",
            record.process_name,
            record
                .pid
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            record.protocol,
            record.local,
            record.remote,
            record.status
        );
        for indicator in &alert.indicators {
            let _ = writeln!(out, "    - {}", indicator);
        }
    }
    let _ = write!(out, "\n{} suspicious connections", alerts.len());
    out
}

/// Render blocklist information
pub fn format_blocklist_text(info: &BlocklistInfo) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Blocked addresses: {}", info.count);
    if let Some(origin) = &info.origin {
        let _ = writeln!(out, "Source: {}", origin);
    }
    if let Some(loaded_at) = info.loaded_at {
        let _ = writeln!(out, "Loaded: {}", loaded_at.to_rfc3339());
    }
    if let Some(error) = &info.last_error {
        let _ = writeln!(out, "Last refresh failed: {}", error);
    }

    if !info.last_added.is_empty() {
        let _ = writeln!(out, "\nLast added:");
        for ip in &info.last_added {
            let _ = writeln!(out, "  {}", ip);
        }
    }

    if !info.ips.is_empty() {
        let _ = writeln!(out, "\nAll entries:");
        for ip in &info.ips {
            let _ = writeln!(out, "  {}", ip);
        }
    }

    out.trim_end().to_string()
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let mut short: String = value.chars().take(max.saturating_sub(1)).collect();
        short.push('~');
        short
    }
}
