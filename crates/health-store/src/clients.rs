//! Client collection manager.

use std::path::{Path, PathBuf};

use health_core::error::Result;
use health_core::formatting::client_line;
use health_core::lookup::{find_by_prefix, find_exact, first_position, matches_prefix, ProgramDirectory};
use health_core::models::{validate_age, validate_name, Client, ClientUpdate, Gender, HealthProgram};
use tracing::info;

use crate::store::CollectionStore;

/// File name of the client store inside the data directory.
pub const CLIENTS_FILE: &str = "clients.json";

/// Owns the client collection and keeps its store in step with it.
///
/// Program names are resolved from a program slice supplied by the caller;
/// this type never reaches into the program store itself.
#[derive(Debug)]
pub struct ClientManager {
    store: CollectionStore<Client>,
    clients: Vec<Client>,
}

impl ClientManager {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = CollectionStore::new(path);
        let clients = store.load();
        Self { store, clients }
    }

    /// Open `clients.json` inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> Self {
        Self::open(data_dir.join(CLIENTS_FILE))
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    /// `true` when the store file existed but could not be loaded. It is set
    /// aside as `<file>.corrupt` on the first successful mutation.
    pub fn store_unreadable(&self) -> bool {
        self.store.is_unreadable()
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Register a new client.
    ///
    /// `program_ids` is stored as given; it is not checked against any
    /// program collection.
    pub fn register(
        &mut self,
        full_name: &str,
        age: i64,
        gender: &str,
        program_ids: Vec<String>,
    ) -> Result<Client> {
        let full_name = validate_name(full_name, "Client")?;
        let age = validate_age(age)?;
        let gender: Gender = gender.parse()?;
        let client = Client::new(full_name, age, gender, program_ids);

        let mut next = self.clients.clone();
        next.push(client.clone());
        self.commit(next)?;

        info!(client_id = %client.client_id, "client registered");
        Ok(client)
    }

    /// Apply `update` to the first client matching `prefix`.
    ///
    /// Returns `Ok(None)` without touching the store when nothing matches.
    pub fn edit(&mut self, prefix: &str, update: &ClientUpdate) -> Result<Option<Client>> {
        let Some(idx) = first_position(&self.clients, prefix) else {
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(self.clients[idx].clone()));
        }

        let mut updated = self.clients[idx].clone();
        update.apply_to(&mut updated)?;

        let mut next = self.clients.clone();
        next[idx] = updated.clone();
        self.commit(next)?;

        info!(client_id = %updated.client_id, "client updated");
        Ok(Some(updated))
    }

    /// Remove every client whose id starts with `prefix`; returns the count.
    ///
    /// An empty prefix matches nothing, so `delete("")` never clears the store.
    pub fn delete(&mut self, prefix: &str) -> Result<usize> {
        let next: Vec<Client> = self
            .clients
            .iter()
            .filter(|c| !matches_prefix(&c.client_id, prefix))
            .cloned()
            .collect();

        let removed = self.clients.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }

        self.commit(next)?;
        info!(prefix, removed, "clients deleted");
        Ok(removed)
    }

    /// First client whose id starts with `prefix`.
    pub fn get_by_id(&self, prefix: &str) -> Option<&Client> {
        first_position(&self.clients, prefix).map(|idx| &self.clients[idx])
    }

    /// Client whose id equals `client_id` exactly.
    pub fn get_exact(&self, client_id: &str) -> Option<&Client> {
        find_exact(&self.clients, client_id)
    }

    /// Every client whose id starts with `prefix`.
    pub fn find(&self, prefix: &str) -> Vec<&Client> {
        find_by_prefix(&self.clients, prefix)
    }

    /// Insertion-order window of at most `limit` clients starting at `offset`.
    pub fn page(&self, offset: usize, limit: usize) -> &[Client] {
        let start = offset.min(self.clients.len());
        let end = start.saturating_add(limit).min(self.clients.len());
        &self.clients[start..end]
    }

    /// One display line per client with program names resolved.
    pub fn list(&self, programs: &[HealthProgram]) -> Vec<String> {
        let directory = ProgramDirectory::new(programs);
        self.clients
            .iter()
            .map(|c| client_line(c, &directory.enrolled_names(c)))
            .collect()
    }

    /// Display lines for clients whose name contains `keyword`, ignoring case.
    pub fn search(&self, keyword: &str, programs: &[HealthProgram]) -> Vec<String> {
        let keyword = keyword.to_lowercase();
        let directory = ProgramDirectory::new(programs);
        self.clients
            .iter()
            .filter(|c| c.full_name.to_lowercase().contains(&keyword))
            .map(|c| client_line(c, &directory.enrolled_names(c)))
            .collect()
    }

    fn commit(&mut self, next: Vec<Client>) -> Result<()> {
        self.store.save(&next)?;
        self.clients = next;
        Ok(())
    }
}
