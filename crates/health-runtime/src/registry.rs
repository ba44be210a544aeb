//! Process-wide home of the two managers.
//!
//! A single [`Registry`] is opened at start-up and shared (as
//! [`SharedRegistry`]) with every active surface, so the console and the HTTP
//! API always see the same records. Each manager sits behind its own mutex,
//! held for the whole read-modify-persist sequence of an operation.
//!
//! Lock order: when both managers are needed, the program lock is taken
//! first. [`Registry::both`] does this for callers.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use health_store::{ClientManager, ProgramManager};

/// Reference-counted handle passed to adapters.
pub type SharedRegistry = Arc<Registry>;

#[derive(Debug)]
pub struct Registry {
    data_dir: PathBuf,
    programs: Mutex<ProgramManager>,
    clients: Mutex<ClientManager>,
}

impl Registry {
    /// Load both stores from `data_dir`.
    pub fn open(data_dir: &Path) -> Self {
        let programs = ProgramManager::open_in(data_dir);
        let clients = ClientManager::open_in(data_dir);
        tracing::info!(
            data_dir = %data_dir.display(),
            programs = programs.len(),
            clients = clients.len(),
            "registry opened"
        );
        Self {
            data_dir: data_dir.to_path_buf(),
            programs: Mutex::new(programs),
            clients: Mutex::new(clients),
        }
    }

    /// [`Registry::open`] wrapped for sharing.
    pub fn shared(data_dir: &Path) -> SharedRegistry {
        Arc::new(Self::open(data_dir))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Exclusive access to the program manager.
    ///
    /// A lock poisoned by a panicking holder is recovered: every mutation is
    /// written to disk before it lands in memory, so the guarded state is
    /// never half-applied.
    pub fn programs(&self) -> MutexGuard<'_, ProgramManager> {
        self.programs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access to the client manager.
    pub fn clients(&self) -> MutexGuard<'_, ClientManager> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Both managers, locked in program-then-client order.
    pub fn both(&self) -> (MutexGuard<'_, ProgramManager>, MutexGuard<'_, ClientManager>) {
        let programs = self.programs();
        let clients = self.clients();
        (programs, clients)
    }

    /// Store files that existed at open but could not be loaded and have not
    /// been replaced since.
    pub fn unreadable_stores(&self) -> Vec<PathBuf> {
        let (programs, clients) = self.both();
        let mut paths = Vec::new();
        if programs.store_unreadable() {
            paths.push(programs.store_path().to_path_buf());
        }
        if clients.store_unreadable() {
            paths.push(clients.store_path().to_path_buf());
        }
        paths
    }

    /// End of the session. Every mutation has already been written, so this
    /// writes nothing and leaves untouched any store it could not read.
    pub fn close(&self) {
        for path in self.unreadable_stores() {
            tracing::warn!(path = %path.display(), "unreadable store left as found");
        }
        tracing::info!(data_dir = %self.data_dir.display(), "registry closed");
    }
}
