//! Socket enumeration and process ownership for netwarden
//!
//! Reads the OS socket table, resolves which process owns each socket, and
//! normalizes every entry into a [`ConnectionRecord`].
//!
//! [`ConnectionRecord`]: netwarden_core::ConnectionRecord

pub mod connections;
pub mod processes;
pub mod procnet;

#[cfg(not(target_os = "linux"))]
pub mod netstat;

pub use connections::{default_source, ConnectionEnumerator};
pub use processes::{resolve_process_name, ProcessResolver, ProcessUnavailable};
pub use procnet::{ConnectionState, ProcNetSource};

#[cfg(not(target_os = "linux"))]
pub use netstat::NetstatSource;
