//! Program collection manager.

use std::path::{Path, PathBuf};

use health_core::error::Result;
use health_core::formatting::program_line;
use health_core::lookup::{find_by_prefix, first_position, matches_prefix};
use health_core::models::{validate_name, HealthProgram, ProgramUpdate};
use tracing::info;

use crate::store::CollectionStore;

/// File name of the program store inside the data directory.
pub const PROGRAMS_FILE: &str = "programs.json";

/// Owns the program collection and keeps its store in step with it.
///
/// Every mutation writes the full collection before it becomes visible in
/// memory, so a failed write leaves both sides unchanged.
#[derive(Debug)]
pub struct ProgramManager {
    store: CollectionStore<HealthProgram>,
    programs: Vec<HealthProgram>,
}

impl ProgramManager {
    /// Open the store at `path`, loading whatever it holds.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = CollectionStore::new(path);
        let programs = store.load();
        Self { store, programs }
    }

    /// Open `programs.json` inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> Self {
        Self::open(data_dir.join(PROGRAMS_FILE))
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    /// `true` when the store file existed but could not be loaded. It is set
    /// aside as `<file>.corrupt` on the first successful mutation.
    pub fn store_unreadable(&self) -> bool {
        self.store.is_unreadable()
    }

    pub fn programs(&self) -> &[HealthProgram] {
        &self.programs
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Create a program from trimmed `name` and `description`.
    pub fn add(&mut self, name: &str, description: &str) -> Result<HealthProgram> {
        let name = validate_name(name, "Program")?;
        let program = HealthProgram::new(name, description.trim());

        let mut next = self.programs.clone();
        next.push(program.clone());
        self.commit(next)?;

        info!(program_id = %program.program_id, name = %program.name, "program created");
        Ok(program)
    }

    /// Every program whose id starts with `prefix`.
    pub fn find(&self, prefix: &str) -> Vec<&HealthProgram> {
        find_by_prefix(&self.programs, prefix)
    }

    /// Earliest-inserted program whose id starts with `prefix`.
    pub fn first(&self, prefix: &str) -> Option<&HealthProgram> {
        first_position(&self.programs, prefix).map(|idx| &self.programs[idx])
    }

    /// Apply `update` to the first program matching `prefix`.
    ///
    /// Returns `Ok(None)` without touching the store when nothing matches.
    pub fn edit(&mut self, prefix: &str, update: &ProgramUpdate) -> Result<Option<HealthProgram>> {
        let Some(idx) = first_position(&self.programs, prefix) else {
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(self.programs[idx].clone()));
        }

        let mut updated = self.programs[idx].clone();
        update.apply_to(&mut updated)?;

        let mut next = self.programs.clone();
        next[idx] = updated.clone();
        self.commit(next)?;

        info!(program_id = %updated.program_id, "program updated");
        Ok(Some(updated))
    }

    /// Remove every program whose id starts with `prefix`.
    ///
    /// Returns how many were removed. An empty prefix matches nothing, so
    /// `delete("")` never clears the store. Clients enrolled in a removed
    /// program keep the id and will show it as an unknown program.
    pub fn delete(&mut self, prefix: &str) -> Result<usize> {
        let next: Vec<HealthProgram> = self
            .programs
            .iter()
            .filter(|p| !matches_prefix(&p.program_id, prefix))
            .cloned()
            .collect();

        let removed = self.programs.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }

        self.commit(next)?;
        info!(prefix, removed, "programs deleted");
        Ok(removed)
    }

    /// One display line per program, in insertion order.
    pub fn list(&self) -> Vec<String> {
        self.programs.iter().map(program_line).collect()
    }

    fn commit(&mut self, next: Vec<HealthProgram>) -> Result<()> {
        self.store.save(&next)?;
        self.programs = next;
        Ok(())
    }
}
