//! Identifier lookup and program-name resolution shared by both managers.
//!
//! Lookups by partial identifier always return every match in insertion
//! order. Callers decide explicitly whether they act on the first match
//! (edit, profile) or on all of them (delete).

use std::collections::HashMap;

use crate::models::{Client, HealthProgram};

/// Rendered in place of a program name when an enrolled id no longer
/// resolves to a stored program.
pub const UNKNOWN_PROGRAM: &str = "Unknown Program";

/// Anything carrying a stable string identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for HealthProgram {
    fn id(&self) -> &str {
        &self.program_id
    }
}

impl Identified for Client {
    fn id(&self) -> &str {
        &self.client_id
    }
}

/// `true` when `id` starts with a non-empty `prefix`.
///
/// An empty prefix matches nothing so that a blank answer at a prompt can
/// never select (or delete) the whole collection.
pub fn matches_prefix(id: &str, prefix: &str) -> bool {
    !prefix.is_empty() && id.starts_with(prefix)
}

/// Every item whose identifier starts with `prefix`, in collection order.
pub fn find_by_prefix<'a, T: Identified>(items: &'a [T], prefix: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| matches_prefix(item.id(), prefix))
        .collect()
}

/// Position of the earliest item whose identifier starts with `prefix`.
pub fn first_position<T: Identified>(items: &[T], prefix: &str) -> Option<usize> {
    items
        .iter()
        .position(|item| matches_prefix(item.id(), prefix))
}

/// The item whose identifier equals `id` exactly.
pub fn find_exact<'a, T: Identified>(items: &'a [T], id: &str) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

// ── ProgramDirectory ──────────────────────────────────────────────────────────

/// Read-only `program_id -> name` table built from a program collection.
#[derive(Debug, Default)]
pub struct ProgramDirectory<'a> {
    names: HashMap<&'a str, &'a str>,
}

impl<'a> ProgramDirectory<'a> {
    pub fn new(programs: &'a [HealthProgram]) -> Self {
        let names = programs
            .iter()
            .map(|p| (p.program_id.as_str(), p.name.as_str()))
            .collect();
        Self { names }
    }

    /// Name for `program_id`, or [`UNKNOWN_PROGRAM`].
    pub fn resolve(&self, program_id: &str) -> &'a str {
        self.names.get(program_id).copied().unwrap_or(UNKNOWN_PROGRAM)
    }

    /// Names for every enrollment of `client`, in enrollment order.
    pub fn enrolled_names(&self, client: &Client) -> Vec<String> {
        client
            .program_ids
            .iter()
            .map(|id| self.resolve(id).to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
