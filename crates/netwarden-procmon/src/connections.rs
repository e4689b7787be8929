//! Connection enumeration

use netwarden_core::{
    ConnectionRecord, Endpoint, NameResolver, ProcmonConfig, RawSocket, Result, SocketSource,
    NOT_AVAILABLE,
};
use tracing::debug;

use crate::processes::ProcessResolver;

/// Socket source for the current platform
pub fn default_source(config: &ProcmonConfig) -> Box<dyn SocketSource> {
    #[cfg(target_os = "linux")]
    {
        Box::new(crate::procnet::ProcNetSource::with_root(&config.proc_root))
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = config;
        Box::new(crate::netstat::NetstatSource::new())
    }
}

/// Lists active internet sockets as normalized connection records.
///
/// Every call reads the live socket table; nothing is cached between calls.
pub struct ConnectionEnumerator {
    source: Box<dyn SocketSource>,
    resolver: Box<dyn NameResolver>,
}

impl ConnectionEnumerator {
    /// Enumerator for the current platform with default settings
    pub fn new() -> Self {
        Self::from_config(&ProcmonConfig::default())
    }

    /// Enumerator for the current platform
    pub fn from_config(config: &ProcmonConfig) -> Self {
        Self::with_parts(default_source(config), Box::new(ProcessResolver::new()))
    }

    /// Enumerator over an explicit source and resolver
    pub fn with_parts(source: Box<dyn SocketSource>, resolver: Box<dyn NameResolver>) -> Self {
        Self { source, resolver }
    }

    /// Read the current connection table.
    ///
    /// Fails with `PermissionDenied` only when the OS refuses to list sockets
    /// at all; individual entries that cannot be resolved degrade to
    /// placeholder values instead.
    pub fn enumerate(&self) -> Result<Vec<ConnectionRecord>> {
        let sockets = self.source.sockets()?;
        self.resolver.refresh();

        let records: Vec<ConnectionRecord> = sockets
            .into_iter()
            .map(|socket| normalize(socket, self.resolver.as_ref()))
            .collect();

        debug!(
            "Enumerated {} connections via {}",
            records.len(),
            self.source.name()
        );
        Ok(records)
    }
}

impl Default for ConnectionEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a raw socket entry into a connection record
pub fn normalize(socket: RawSocket, resolver: &dyn NameResolver) -> ConnectionRecord {
    let status = socket
        .state
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    ConnectionRecord {
        pid: socket.pid,
        process_name: resolver.resolve(socket.pid),
        protocol: socket.protocol,
        local: Endpoint::from(socket.local),
        remote: Endpoint::from(socket.remote),
        status,
        family: socket.family,
    }
}
