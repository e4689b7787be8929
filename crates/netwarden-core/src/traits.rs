//! Seams between the enumeration engine and the operating system.
//!
//! Production code plugs in OS-backed implementations; tests substitute
//! fixed data.

use crate::error::Result;
use crate::record::{AddressFamily, Protocol};
use std::net::SocketAddr;

/// Socket entry as read from the OS, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSocket {
    /// Transport protocol
    pub protocol: Protocol,
    /// Address family
    pub family: AddressFamily,
    /// Local address, if bound
    pub local: Option<SocketAddr>,
    /// Remote address, if connected
    pub remote: Option<SocketAddr>,
    /// OS-reported state (`ESTABLISHED`, `LISTEN`, ...)
    pub state: Option<String>,
    /// Owning process, if the OS disclosed it
    pub pid: Option<u32>,
}

/// A source of socket table entries
pub trait SocketSource: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Read the current socket table.
    ///
    /// Must return [`crate::NetWardenError::PermissionDenied`] when the OS
    /// refuses to list sockets at all.
    fn sockets(&self) -> Result<Vec<RawSocket>>;
}

/// Maps a process id to a display name
pub trait NameResolver: Send + Sync {
    /// Resolve a name. Never fails: exited or restricted processes yield a
    /// placeholder, and `None` yields the system sentinel.
    fn resolve(&self, pid: Option<u32>) -> String;

    /// Re-read process state before a batch of lookups
    fn refresh(&self) {}
}
