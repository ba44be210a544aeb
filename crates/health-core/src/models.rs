use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HealthError, Result};
use crate::time_utils::{iso8601, stored_now};

/// Number of identifier characters shown in listings.
pub const SHORT_ID_LEN: usize = 8;

/// Return the first [`SHORT_ID_LEN`] characters of an identifier.
pub fn short_id(id: &str) -> &str {
    id.char_indices()
        .nth(SHORT_ID_LEN)
        .map(|(idx, _)| &id[..idx])
        .unwrap_or(id)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ── Field checks ──────────────────────────────────────────────────────────────

/// Trim `raw` and reject it when nothing is left.
///
/// `label` names the entity in the error, e.g. `"Program"`.
pub fn validate_name(raw: &str, label: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(HealthError::validation(format!("{label} name cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Accept strictly positive ages that fit the stored width.
pub fn validate_age(age: i64) -> Result<u32> {
    if age <= 0 {
        return Err(HealthError::validation("Age must be positive"));
    }
    u32::try_from(age).map_err(|_| HealthError::validation("Age is out of range"))
}

// ── Gender ────────────────────────────────────────────────────────────────────

/// The fixed set of genders a client may be registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(alias = "male")]
    Male,
    #[serde(alias = "female")]
    Female,
    #[serde(alias = "other")]
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = HealthError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(HealthError::validation("Gender must be Male, Female, or Other")),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── HealthProgram ─────────────────────────────────────────────────────────────

/// A health program clients can be enrolled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthProgram {
    /// Display name, never empty after trimming.
    pub name: String,
    /// Free-form description, may be empty.
    #[serde(default)]
    pub description: String,
    /// UUID assigned at creation.
    pub program_id: String,
    /// When the program was created.
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
}

impl HealthProgram {
    /// Build a program with a fresh identifier and the current time.
    ///
    /// Callers are expected to have validated `name` already.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            program_id: new_id(),
            created_at: stored_now(),
        }
    }

    pub fn short_id(&self) -> &str {
        short_id(&self.program_id)
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// A person registered with one or more health programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Full name, never empty after trimming.
    pub full_name: String,
    /// Age in years, always positive.
    pub age: u32,
    pub gender: Gender,
    /// Enrolled program identifiers in enrollment order. Not checked against
    /// the program store, so entries may dangle after a program is deleted.
    #[serde(default)]
    pub program_ids: Vec<String>,
    /// UUID assigned at registration.
    pub client_id: String,
    /// When the client was registered.
    #[serde(with = "iso8601")]
    pub registered_at: DateTime<Utc>,
}

impl Client {
    /// Build a client with a fresh identifier and the current time.
    pub fn new(full_name: impl Into<String>, age: u32, gender: Gender, program_ids: Vec<String>) -> Self {
        Self {
            full_name: full_name.into(),
            age,
            gender,
            program_ids,
            client_id: new_id(),
            registered_at: stored_now(),
        }
    }

    pub fn short_id(&self) -> &str {
        short_id(&self.client_id)
    }
}

// ── Partial updates ───────────────────────────────────────────────────────────

/// Field changes for a program edit. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramUpdate {
    pub name: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
}

impl ProgramUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Field changes for a client edit. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientUpdate {
    pub full_name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    /// `Some(vec![])` clears every enrollment; `None` keeps them.
    pub program_ids: Option<Vec<String>>,
}

impl ClientUpdate {
    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn program_ids(mut self, program_ids: Vec<String>) -> Self {
        self.program_ids = Some(program_ids);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.program_ids.is_none()
    }

    /// Apply every present field to `client`.
    ///
    /// All present values are checked before anything is written, so a
    /// rejected update leaves `client` untouched.
    pub fn apply_to(&self, client: &mut Client) -> Result<()> {
        let full_name = self
            .full_name
            .as_deref()
            .map(|n| validate_name(n, "Client"))
            .transpose()?;
        let age = self.age.map(validate_age).transpose()?;
        let gender = self.gender.as_deref().map(Gender::from_str).transpose()?;

        if let Some(full_name) = full_name {
            client.full_name = full_name;
        }
        if let Some(age) = age {
            client.age = age;
        }
        if let Some(gender) = gender {
            client.gender = gender;
        }
        if let Some(ids) = &self.program_ids {
            client.program_ids = ids.clone();
        }
        Ok(())
    }
}

impl ProgramUpdate {
    /// Apply every present field to `program`; see [`ClientUpdate::apply_to`].
    pub fn apply_to(&self, program: &mut HealthProgram) -> Result<()> {
        let name = self
            .name
            .as_deref()
            .map(|n| validate_name(n, "Program"))
            .transpose()?;

        if let Some(name) = name {
            program.name = name;
        }
        if let Some(description) = &self.description {
            program.description = description.trim().to_string();
        }
        Ok(())
    }
}
