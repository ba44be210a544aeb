use crate::models::{Client, HealthProgram};

/// Shown in a client listing line when the client has no enrollments.
pub const NO_PROGRAMS: &str = "No programs";

/// One-line program summary: `"{name} ({short id}): {description}"`.
///
/// # Examples
///
/// ```
/// use health_core::formatting::program_line;
/// use health_core::models::HealthProgram;
///
/// let mut p = HealthProgram::new("Nutrition", "Healthy eating");
/// p.program_id = "1234567890ab".to_string();
/// assert_eq!(program_line(&p), "Nutrition (12345678): Healthy eating");
/// ```
pub fn program_line(program: &HealthProgram) -> String {
    format!(
        "{} ({}): {}",
        program.name,
        program.short_id(),
        program.description
    )
}

/// One-line client summary using already-resolved program names.
///
/// `"{full_name} ({age}, {gender}) - Programs: {names} (ID: {short id})"`,
/// with [`NO_PROGRAMS`] when `program_names` is empty.
pub fn client_line(client: &Client, program_names: &[String]) -> String {
    format!(
        "{} ({}, {}) - Programs: {} (ID: {})",
        client.full_name,
        client.age,
        client.gender,
        join_or(program_names, NO_PROGRAMS),
        client.short_id()
    )
}

/// Comma-join `items`, or return `fallback` when there are none.
///
/// # Examples
///
/// ```
/// use health_core::formatting::join_or;
///
/// assert_eq!(join_or(&["a".to_string(), "b".to_string()], "none"), "a, b");
/// assert_eq!(join_or(&[], "none"), "none");
/// ```
pub fn join_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}
