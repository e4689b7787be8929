//! Connection records produced by enumeration and stored in captures

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Process name reported for sockets without an owning process
pub const SYSTEM_PROCESS: &str = "System";

/// Sentinel for absent or malformed values
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder name for a process that exited or cannot be inspected
pub fn inaccessible_process(pid: u32) -> String {
    format!("[PID {} - inaccessible]", pid)
}

/// Transport protocol of a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
    #[serde(other)]
    Other,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Other => "Other",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address family of a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    IPv4,
    IPv6,
    #[serde(other)]
    Other,
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFamily::IPv4 => "IPv4",
            AddressFamily::IPv6 => "IPv6",
            AddressFamily::Other => "Other",
        }
    }

    /// Family of a concrete IP address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::IPv4,
            IpAddr::V6(_) => AddressFamily::IPv6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a connection.
///
/// Rendered as `ip:port` (IPv6 in brackets), the bare value, or `N/A`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// IP address and port
    Socket { ip: IpAddr, port: u16 },
    /// A value that is not an `ip:port` pair, kept verbatim
    Bare(String),
    /// No endpoint (unconnected socket, missing data)
    Absent,
}

impl Endpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Endpoint::Socket { ip, port }
    }

    /// Parse the textual form back into an endpoint. Never fails: anything
    /// that is not an address pair is kept as a bare value.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == NOT_AVAILABLE {
            return Endpoint::Absent;
        }

        if let Ok(addr) = value.parse::<SocketAddr>() {
            return Endpoint::new(addr.ip(), addr.port());
        }

        // Unbracketed IPv6 with a trailing port, e.g. "::1:8080"
        if let Some((ip, port)) = value.rsplit_once(':') {
            if let (Ok(ip), Ok(port)) = (ip.parse::<IpAddr>(), port.parse::<u16>()) {
                return Endpoint::new(ip, port);
            }
        }

        Endpoint::Bare(value.to_string())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Endpoint::Absent)
    }

    /// IP portion of the endpoint as text, if any
    pub fn ip(&self) -> Option<String> {
        match self {
            Endpoint::Socket { ip, .. } => Some(ip.to_string()),
            Endpoint::Bare(value) => Some(value.clone()),
            Endpoint::Absent => None,
        }
    }

    /// Numeric port portion of the endpoint, if any
    pub fn port(&self) -> Option<u16> {
        match self {
            Endpoint::Socket { port, .. } => Some(*port),
            _ => None,
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Endpoint::new(addr.ip(), addr.port())
    }
}

impl From<Option<SocketAddr>> for Endpoint {
    fn from(addr: Option<SocketAddr>) -> Self {
        addr.map(Endpoint::from).unwrap_or(Endpoint::Absent)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Socket { ip, port } => write!(f, "{}", SocketAddr::new(*ip, *port)),
            Endpoint::Bare(value) => f.write_str(value),
            Endpoint::Absent => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value: Option<String> = Option::deserialize(deserializer)?;
        Ok(value.as_deref().map(Endpoint::parse).unwrap_or(Endpoint::Absent))
    }
}

/// Normalized description of one active socket, enriched with its owner.
///
/// Built fresh on every enumeration. The suspicious verdict is not part of
/// the record; see [`ClassifiedConnection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Owning process id, `None` for kernel/system sockets
    #[serde(default)]
    pub pid: Option<u32>,
    /// Owning process name
    #[serde(rename = "process")]
    pub process_name: String,
    /// Transport protocol
    pub protocol: Protocol,
    /// Local endpoint; `null` reads as absent
    #[serde(rename = "local_address")]
    pub local: Endpoint,
    /// Remote endpoint; `null` reads as absent
    #[serde(rename = "remote_address")]
    pub remote: Endpoint,
    /// Connection state as reported by the OS
    pub status: String,
    /// Address family
    pub family: AddressFamily,
}

impl ConnectionRecord {
    /// Whether the socket belongs to the kernel rather than a process
    pub fn is_system(&self) -> bool {
        self.pid.is_none()
    }
}

/// A connection record with the verdict attached by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedConnection {
    #[serde(flatten)]
    pub record: ConnectionRecord,
    #[serde(default)]
    pub suspicious: bool,
}
