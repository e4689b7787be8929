//! Socket table reader for Linux procfs (`/proc/net/{tcp,tcp6,udp,udp6}`)

use netwarden_core::{AddressFamily, NetWardenError, Protocol, RawSocket, Result, SocketSource};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// TCP connection state as encoded in the `st` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    Unknown,
}

impl ConnectionState {
    pub fn from_hex(state: u8) -> Self {
        match state {
            1 => ConnectionState::Established,
            2 => ConnectionState::SynSent,
            3 => ConnectionState::SynRecv,
            4 => ConnectionState::FinWait1,
            5 => ConnectionState::FinWait2,
            6 => ConnectionState::TimeWait,
            7 => ConnectionState::Close,
            8 => ConnectionState::CloseWait,
            9 => ConnectionState::LastAck,
            10 => ConnectionState::Listen,
            11 => ConnectionState::Closing,
            _ => ConnectionState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Established => "ESTABLISHED",
            ConnectionState::SynSent => "SYN_SENT",
            ConnectionState::SynRecv => "SYN_RECV",
            ConnectionState::FinWait1 => "FIN_WAIT1",
            ConnectionState::FinWait2 => "FIN_WAIT2",
            ConnectionState::TimeWait => "TIME_WAIT",
            ConnectionState::Close => "CLOSE",
            ConnectionState::CloseWait => "CLOSE_WAIT",
            ConnectionState::LastAck => "LAST_ACK",
            ConnectionState::Listen => "LISTEN",
            ConnectionState::Closing => "CLOSING",
            ConnectionState::Unknown => "UNKNOWN",
        }
    }
}

/// State reported for connectionless sockets
pub const UDP_STATE: &str = "NONE";

const TABLES: [(&str, Protocol, AddressFamily); 4] = [
    ("tcp", Protocol::Tcp, AddressFamily::IPv4),
    ("tcp6", Protocol::Tcp, AddressFamily::IPv6),
    ("udp", Protocol::Udp, AddressFamily::IPv4),
    ("udp6", Protocol::Udp, AddressFamily::IPv6),
];

/// One parsed table line, before ownership is known
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableEntry {
    socket: RawSocket,
    inode: u64,
}

/// Reads sockets from a procfs mount
pub struct ProcNetSource {
    root: PathBuf,
}

impl ProcNetSource {
    /// Source reading from `/proc`
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Source reading from an alternative procfs root
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_table(&self, name: &str) -> Result<Option<String>> {
        let path = self.root.join("net").join(name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(
                NetWardenError::PermissionDenied(format!("cannot read {}", path.display())),
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Socket table {} not present", path.display());
                Ok(None)
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }
}

impl Default for ProcNetSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SocketSource for ProcNetSource {
    fn name(&self) -> &str {
        "procfs"
    }

    fn sockets(&self) -> Result<Vec<RawSocket>> {
        let mut entries = Vec::new();
        let mut tables_read = 0;

        for (name, protocol, family) in TABLES {
            if let Some(content) = self.read_table(name)? {
                tables_read += 1;
                entries.extend(parse_table(&content, protocol, family));
            }
        }

        if tables_read == 0 {
            return Err(NetWardenError::NotFound(format!(
                "no socket tables under {}",
                self.root.join("net").display()
            )));
        }

        let owners = build_inode_pid_map(&self.root);

        Ok(entries
            .into_iter()
            .map(|entry| {
                let mut socket = entry.socket;
                socket.pid = owners.get(&entry.inode).copied();
                socket
            })
            .collect())
    }
}

/// Parse one socket table, skipping the header and any malformed line
fn parse_table(content: &str, protocol: Protocol, family: AddressFamily) -> Vec<TableEntry> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let entry = parse_line(line, protocol, family);
            if entry.is_none() {
                debug!("Skipping malformed socket line: {}", line.trim());
            }
            entry
        })
        .collect()
}

fn parse_line(line: &str, protocol: Protocol, family: AddressFamily) -> Option<TableEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 10 {
        return None;
    }

    let is_ipv6 = family == AddressFamily::IPv6;
    let local = parse_hex_socket(parts[1], is_ipv6)?;
    let remote = parse_hex_socket(parts[2], is_ipv6)?;

    let state = match protocol {
        Protocol::Tcp => {
            let code = u8::from_str_radix(parts[3], 16).unwrap_or(0);
            ConnectionState::from_hex(code).as_str()
        }
        _ => UDP_STATE,
    };

    let inode = parts[9].parse().unwrap_or(0);

    // A zero peer means "not connected"
    let remote = if remote.ip().is_unspecified() && remote.port() == 0 {
        None
    } else {
        Some(remote)
    };

    Some(TableEntry {
        socket: RawSocket {
            protocol,
            family,
            local: Some(local),
            remote,
            state: Some(state.to_string()),
            pid: None,
        },
        inode,
    })
}

fn parse_hex_socket(field: &str, is_ipv6: bool) -> Option<SocketAddr> {
    let (addr, port) = field.split_once(':')?;
    let ip = parse_hex_addr(addr, is_ipv6)?;
    let port = u16::from_str_radix(port, 16).ok()?;
    Some(SocketAddr::new(ip, port))
}

/// Decode a procfs address. The kernel prints each 32-bit word of the
/// network-order address as a host-order integer.
fn parse_hex_addr(hex: &str, is_ipv6: bool) -> Option<IpAddr> {
    if is_ipv6 {
        if hex.len() != 32 {
            return None;
        }

        let mut bytes = [0u8; 16];
        for (i, chunk) in bytes.chunks_exact_mut(4).enumerate() {
            let word = u32::from_str_radix(hex.get(i * 8..i * 8 + 8)?, 16).ok()?;
            chunk.copy_from_slice(&word.to_ne_bytes());
        }

        Some(IpAddr::V6(Ipv6Addr::from(bytes)))
    } else {
        if hex.len() != 8 {
            return None;
        }

        let word = u32::from_str_radix(hex, 16).ok()?;
        Some(IpAddr::V4(Ipv4Addr::from(word.to_ne_bytes())))
    }
}

/// Map socket inodes to the pid holding them open.
///
/// Processes may exit mid-scan and fd directories of other users are
/// unreadable without privileges; both simply leave inodes unmapped.
fn build_inode_pid_map(root: &Path) -> HashMap<u64, u32> {
    let pids: Vec<u32> = match fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_string_lossy().parse::<u32>().ok())
            .collect(),
        Err(e) => {
            warn!("Cannot list processes under {}: {}", root.display(), e);
            return HashMap::new();
        }
    };

    pids.par_iter()
        .flat_map_iter(|&pid| {
            socket_inodes(&root.join(pid.to_string()).join("fd"))
                .into_iter()
                .map(move |inode| (inode, pid))
        })
        .collect()
}

fn socket_inodes(fd_dir: &Path) -> Vec<u64> {
    let Ok(fds) = fs::read_dir(fd_dir) else {
        return Vec::new();
    };

    fds.filter_map(|fd| fd.ok())
        .filter_map(|fd| fs::read_link(fd.path()).ok())
        .filter_map(|link| {
            link.to_string_lossy()
                .strip_prefix("socket:[")
                .and_then(|s| s.strip_suffix(']'))
                .and_then(|s| s.parse().ok())
        })
        .collect()
}
