//! Read-side views of the stored records.
//!
//! These are the shapes handed to the HTTP surface and the console profile
//! screen; they carry resolved program names and display-formatted times
//! rather than raw identifiers and UTC instants.

use chrono_tz::Tz;
use serde::Serialize;

use crate::lookup::ProgramDirectory;
use crate::models::{Client, HealthProgram};
use crate::time_utils::format_display;

/// Public view of a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientProfile {
    pub full_name: String,
    pub age: u32,
    pub gender: String,
    /// `YYYY-MM-DD HH:MM:SS` in the configured timezone.
    pub registered_at: String,
    /// Resolved program names, `"Unknown Program"` for dangling ids.
    pub enrolled_programs: Vec<String>,
    pub client_id: String,
}

impl ClientProfile {
    pub fn new(client: &Client, directory: &ProgramDirectory<'_>, tz: &Tz) -> Self {
        Self {
            full_name: client.full_name.clone(),
            age: client.age,
            gender: client.gender.to_string(),
            registered_at: format_display(&client.registered_at, tz),
            enrolled_programs: directory.enrolled_names(client),
            client_id: client.client_id.clone(),
        }
    }
}

/// Public view of a health program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramSummary {
    pub program_id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

impl ProgramSummary {
    pub fn new(program: &HealthProgram, tz: &Tz) -> Self {
        Self {
            program_id: program.program_id.clone(),
            name: program.name.clone(),
            description: program.description.clone(),
            created_at: format_display(&program.created_at, tz),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::UNKNOWN_PROGRAM;
    use crate::models::Gender;
    use crate::time_utils::parse_timestamp;

    #[test]
    fn test_client_profile_resolves_names_and_formats_time() {
        let programs = vec![HealthProgram::new("Nutrition", "")];
        let mut client = Client::new(
            "Alice",
            30,
            Gender::Female,
            vec![programs[0].program_id.clone(), "missing".to_string()],
        );
        client.registered_at = parse_timestamp("2024-05-06T07:08:09Z").unwrap();

        let dir = ProgramDirectory::new(&programs);
        let profile = ClientProfile::new(&client, &dir, &Tz::UTC);

        assert_eq!(profile.registered_at, "2024-05-06 07:08:09");
        assert_eq!(profile.enrolled_programs, vec!["Nutrition", UNKNOWN_PROGRAM]);
        assert_eq!(profile.gender, "Female");
        assert_eq!(profile.client_id, client.client_id);
    }

    #[test]
    fn test_client_profile_json_shape() {
        let client = Client::new("Bob", 50, Gender::Male, vec![]);
        let dir = ProgramDirectory::default();
        let value = serde_json::to_value(ClientProfile::new(&client, &dir, &Tz::UTC)).unwrap();
        assert_eq!(value["full_name"], "Bob");
        assert_eq!(value["age"], 50);
        assert!(value["enrolled_programs"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_program_summary_copies_fields() {
        let program = HealthProgram::new("Fitness", "Move more");
        let summary = ProgramSummary::new(&program, &Tz::UTC);
        assert_eq!(summary.program_id, program.program_id);
        assert_eq!(summary.name, "Fitness");
        assert_eq!(summary.description, "Move more");
        assert_eq!(summary.created_at.len(), "YYYY-MM-DD HH:MM:SS".len());
    }
}
