//! Process name resolution

use netwarden_core::{inaccessible_process, NameResolver, SYSTEM_PROCESS};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};
use tracing::debug;

/// Why a process name could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessUnavailable {
    /// The process exited before it could be inspected
    Exited,
    /// The process is a zombie
    Zombie,
    /// The OS refused to disclose the process name
    AccessDenied,
}

impl fmt::Display for ProcessUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessUnavailable::Exited => write!(f, "process exited"),
            ProcessUnavailable::Zombie => write!(f, "zombie process"),
            ProcessUnavailable::AccessDenied => write!(f, "access denied"),
        }
    }
}

/// Resolves process ids against a process table snapshot.
///
/// The snapshot is taken by [`NameResolver::refresh`]; ids missing from it
/// are looked up once more individually before giving up, since the process
/// may have started after the snapshot.
pub struct ProcessResolver {
    system: Mutex<System>,
}

impl ProcessResolver {
    /// Create a resolver with a fresh process table
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);
        Self {
            system: Mutex::new(system),
        }
    }

    /// Look up the name of a running process
    pub fn lookup(&self, pid: u32) -> Result<String, ProcessUnavailable> {
        let pid = Pid::from_u32(pid);
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);

        if system.process(pid).is_none() {
            system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        }

        let process = system.process(pid).ok_or(ProcessUnavailable::Exited)?;
        if matches!(process.status(), ProcessStatus::Zombie) {
            return Err(ProcessUnavailable::Zombie);
        }

        let name = process.name().to_string_lossy();
        if name.is_empty() {
            return Err(ProcessUnavailable::AccessDenied);
        }

        Ok(name.into_owned())
    }
}

impl Default for ProcessResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NameResolver for ProcessResolver {
    fn resolve(&self, pid: Option<u32>) -> String {
        let Some(pid) = pid else {
            return SYSTEM_PROCESS.to_string();
        };

        match self.lookup(pid) {
            Ok(name) => name,
            Err(reason) => {
                debug!("Cannot resolve PID {}: {}", pid, reason);
                inaccessible_process(pid)
            }
        }
    }

    fn refresh(&self) {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_processes(ProcessesToUpdate::All, true);
    }
}

/// Resolve a single process name without keeping a resolver around
pub fn resolve_process_name(pid: Option<u32>) -> String {
    let Some(pid) = pid else {
        return SYSTEM_PROCESS.to_string();
    };

    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);
    let resolver = ProcessResolver {
        system: Mutex::new(system),
    };
    resolver.resolve(Some(pid))
}
