use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;

use crate::constants::{
    AUTHORIZATION_MAX_POLLS, AUTHORIZATION_POLL_INTERVAL, FILE_ACCESS_PROBE_FILE,
    FULL_DISK_PROBE_PATHS,
};
use crate::error::{Result, SharkError};
use crate::paths;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    FileSystemAccess,
    FullDiskAccess,
    NetworkAccess,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Capability::FileSystemAccess => "file system access",
            Capability::FullDiskAccess => "full disk access",
            Capability::NetworkAccess => "network access",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationStatus {
    NotDetermined,
    Authorized,
    Denied,
    Restricted,
}

#[derive(Debug, Default)]
struct GateState {
    statuses: HashMap<Capability, AuthorizationStatus>,
    pending: Option<Capability>,
}

/// Per-capability permission decisions.
///
/// A caller that needs an undecided capability blocks in [`require`] until
/// another thread calls [`resolve`] (typically the presentation layer after
/// showing a prompt it discovered through [`pending`]). If nobody answers
/// within the backstop window the request counts as denied.
///
/// [`require`]: PermissionGate::require
/// [`resolve`]: PermissionGate::resolve
/// [`pending`]: PermissionGate::pending
#[derive(Debug)]
pub struct PermissionGate {
    state: Mutex<GateState>,
    decided: Condvar,
    backstop: Duration,
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::with_backstop(AUTHORIZATION_POLL_INTERVAL * AUTHORIZATION_MAX_POLLS)
    }

    pub fn with_backstop(backstop: Duration) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            decided: Condvar::new(),
            backstop,
        }
    }

    /// A gate whose statuses come from probing the running system.
    pub fn probe() -> Self {
        let gate = Self::new();
        let file_access = probe_file_system_access();
        gate.set_status(Capability::FileSystemAccess, file_access);
        gate.set_status(
            Capability::FullDiskAccess,
            probe_full_disk_access(file_access),
        );
        gate.set_status(Capability::NetworkAccess, AuthorizationStatus::Authorized);
        gate
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self, capability: Capability) -> AuthorizationStatus {
        self.lock()
            .statuses
            .get(&capability)
            .copied()
            .unwrap_or(AuthorizationStatus::NotDetermined)
    }

    pub fn set_status(&self, capability: Capability, status: AuthorizationStatus) {
        let mut state = self.lock();
        state.statuses.insert(capability, status);
        if status != AuthorizationStatus::NotDetermined && state.pending == Some(capability) {
            state.pending = None;
        }
        self.decided.notify_all();
    }

    /// The capability a blocked caller is currently waiting on, if any.
    pub fn pending(&self) -> Option<Capability> {
        self.lock().pending
    }

    /// Records the user's answer for `capability` and wakes waiters.
    pub fn resolve(&self, capability: Capability, granted: bool) {
        let status = if granted {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        };
        tracing::info!(%capability, granted, "authorization resolved");
        self.set_status(capability, status);
    }

    /// Whether `capability` is usable. Undecided capabilities are surfaced via
    /// [`PermissionGate::pending`] and waited on.
    pub fn require(&self, capability: Capability) -> bool {
        let mut state = self.lock();
        match state
            .statuses
            .get(&capability)
            .copied()
            .unwrap_or(AuthorizationStatus::NotDetermined)
        {
            AuthorizationStatus::Authorized => return true,
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => return false,
            AuthorizationStatus::NotDetermined => {}
        }

        state.pending = Some(capability);
        let (mut state, timeout) = match self.decided.wait_timeout_while(
            state,
            self.backstop,
            |state| {
                state
                    .statuses
                    .get(&capability)
                    .map(|status| *status == AuthorizationStatus::NotDetermined)
                    .unwrap_or(true)
            },
        ) {
            Ok(result) => result,
            Err(poisoned) => poisoned.into_inner(),
        };

        if timeout.timed_out() {
            tracing::warn!(%capability, "authorization request timed out; treating as denied");
            if state.pending == Some(capability) {
                state.pending = None;
            }
            return false;
        }

        state.statuses.get(&capability).copied() == Some(AuthorizationStatus::Authorized)
    }

    pub fn require_or_err(&self, capability: Capability) -> Result<()> {
        if self.require(capability) {
            Ok(())
        } else {
            Err(SharkError::NotAuthorized(capability))
        }
    }
}

/// Probes the documents directory, or the home directory when there is none.
fn probe_file_system_access() -> AuthorizationStatus {
    let Some(dir) = paths::documents_dir()
        .filter(|dir| dir.is_dir())
        .or_else(|| paths::dirs_home().filter(|dir| dir.is_dir()))
    else {
        return AuthorizationStatus::NotDetermined;
    };
    probe_writable(&dir)
}

fn probe_writable(dir: &Path) -> AuthorizationStatus {
    let probe = dir.join(FILE_ACCESS_PROBE_FILE);
    match fs::write(&probe, "test") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            AuthorizationStatus::Authorized
        }
        Err(error) => {
            tracing::debug!(dir = %dir.display(), %error, "file system probe failed");
            AuthorizationStatus::Denied
        }
    }
}

fn probe_full_disk_access(file_access: AuthorizationStatus) -> AuthorizationStatus {
    if FULL_DISK_PROBE_PATHS
        .iter()
        .any(|path| fs::read_dir(path).is_ok())
    {
        return AuthorizationStatus::Authorized;
    }
    if file_access == AuthorizationStatus::Denied {
        return AuthorizationStatus::Denied;
    }
    AuthorizationStatus::NotDetermined
}
