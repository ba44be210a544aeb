//! Numbered text menu over the shared registry.
//!
//! Every menu entry gathers its answers first and only then locks the
//! manager(s) it needs, so a console waiting on input never blocks the HTTP
//! surface running beside it.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use chrono_tz::Tz;
use health_core::formatting::{client_line, join_or, program_line};
use health_core::lookup::ProgramDirectory;
use health_core::models::{Client, ClientUpdate, HealthProgram, ProgramUpdate};
use health_core::projection::ClientProfile;
use health_runtime::registry::SharedRegistry;

use crate::auth::{authenticate, MAX_ATTEMPTS};

// ── MenuChoice ────────────────────────────────────────────────────────────────

/// Entries of the main menu, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    CreateProgram,
    ViewPrograms,
    RegisterClient,
    ViewClients,
    ViewProfile,
    SearchClients,
    EditProgram,
    DeleteProgram,
    EditClient,
    DeleteClient,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 11] = [
        MenuChoice::CreateProgram,
        MenuChoice::ViewPrograms,
        MenuChoice::RegisterClient,
        MenuChoice::ViewClients,
        MenuChoice::ViewProfile,
        MenuChoice::SearchClients,
        MenuChoice::EditProgram,
        MenuChoice::DeleteProgram,
        MenuChoice::EditClient,
        MenuChoice::DeleteClient,
        MenuChoice::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::CreateProgram => "Create new program",
            MenuChoice::ViewPrograms => "View all programs",
            MenuChoice::RegisterClient => "Register new client (enroll in multiple programs)",
            MenuChoice::ViewClients => "View all clients",
            MenuChoice::ViewProfile => "View a client's profile",
            MenuChoice::SearchClients => "Search for a client",
            MenuChoice::EditProgram => "Edit a program",
            MenuChoice::DeleteProgram => "Delete a program",
            MenuChoice::EditClient => "Edit a client",
            MenuChoice::DeleteClient => "Delete a client",
            MenuChoice::Exit => "Exit",
        }
    }
}

impl FromStr for MenuChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| MenuChoice::ALL.get(idx).copied())
            .ok_or_else(|| s.trim().to_string())
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Selection parsing ─────────────────────────────────────────────────────────

/// Parse a comma-separated list of 1-based menu numbers into indices.
///
/// A blank answer yields an empty list.
pub fn parse_selection(raw: &str, available: usize) -> Result<Vec<usize>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(str::trim)
        .map(|part| match part.parse::<usize>() {
            Ok(n) if (1..=available).contains(&n) => Ok(n - 1),
            _ => Err(format!("Invalid program selection: {part}")),
        })
        .collect()
}

/// `Some(trimmed)` for a non-blank answer, `None` for "keep current".
fn keep_if_blank(answer: String) -> Option<String> {
    let trimmed = answer.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ── Console ───────────────────────────────────────────────────────────────────

/// Interactive session reading answers from `input` and writing to `output`.
pub struct Console<R, W> {
    registry: SharedRegistry,
    timezone: Tz,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(registry: SharedRegistry, timezone: Tz, input: R, output: W) -> Self {
        Self {
            registry,
            timezone,
            input,
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the shared-secret gate, then the menu loop if it passes.
    ///
    /// Returns whether access was granted.
    pub fn run_with_gate(&mut self, secret: &str) -> io::Result<bool> {
        let granted = authenticate(&mut self.input, &mut self.output, secret, MAX_ATTEMPTS)?;
        if !granted {
            return Ok(false);
        }
        self.run()?;
        Ok(true)
    }

    /// Show the menu until the user exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.print_menu()?;
            let answer = match self.prompt("Enter your choice (1-11): ") {
                Ok(answer) => answer,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e),
            };

            let choice = match answer.parse::<MenuChoice>() {
                Ok(choice) => choice,
                Err(_) => {
                    self.say("Invalid choice. Please enter a number between 1 and 11.")?;
                    continue;
                }
            };

            if choice == MenuChoice::Exit {
                self.say("Goodbye!")?;
                return Ok(());
            }

            match self.dispatch(choice) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    fn dispatch(&mut self, choice: MenuChoice) -> io::Result<()> {
        tracing::debug!(?choice, "menu choice");
        match choice {
            MenuChoice::CreateProgram => self.create_program(),
            MenuChoice::ViewPrograms => self.view_programs(),
            MenuChoice::RegisterClient => self.register_client(),
            MenuChoice::ViewClients => self.view_clients(),
            MenuChoice::ViewProfile => self.view_profile(),
            MenuChoice::SearchClients => self.search_clients(),
            MenuChoice::EditProgram => self.edit_program(),
            MenuChoice::DeleteProgram => self.delete_program(),
            MenuChoice::EditClient => self.edit_client(),
            MenuChoice::DeleteClient => self.delete_client(),
            MenuChoice::Exit => Ok(()),
        }
    }

    // ── I/O helpers ───────────────────────────────────────────────────────

    fn say(&mut self, line: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.output, "{}", line.as_ref())
    }

    fn say_numbered(&mut self, lines: &[String]) -> io::Result<()> {
        for (i, line) in lines.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, line)?;
        }
        Ok(())
    }

    /// Print `label` and read one line; end of input is `UnexpectedEof`.
    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn print_menu(&mut self) -> io::Result<()> {
        self.say("\nHealth Program Manager")?;
        for (i, choice) in MenuChoice::ALL.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, choice)?;
        }
        Ok(())
    }

    /// Snapshot of the programs, listed with their menu numbers.
    fn show_program_choices(&mut self) -> io::Result<Vec<HealthProgram>> {
        let programs = self.registry.programs().programs().to_vec();
        self.say("\nAvailable Programs:")?;
        for (i, p) in programs.iter().enumerate() {
            writeln!(self.output, "{}. {} ({})", i + 1, p.name, p.short_id())?;
        }
        Ok(programs)
    }

    fn client_summary(&self, client: &Client) -> String {
        let programs = self.registry.programs();
        let directory = ProgramDirectory::new(programs.programs());
        client_line(client, &directory.enrolled_names(client))
    }

    // ── Program entries ───────────────────────────────────────────────────

    fn create_program(&mut self) -> io::Result<()> {
        let name = self.prompt("Enter program name: ")?;
        let description = self.prompt("Enter description (optional): ")?;

        let result = self.registry.programs().add(&name, &description);
        match result {
            Ok(program) => self.say(format!("Successfully created: {}", program_line(&program))),
            Err(e) => self.say(format!("Error: {e}")),
        }
    }

    fn view_programs(&mut self) -> io::Result<()> {
        let lines = self.registry.programs().list();
        self.say("\nCurrent Health Programs:")?;
        if lines.is_empty() {
            return self.say("No programs available yet.");
        }
        self.say_numbered(&lines)
    }

    fn edit_program(&mut self) -> io::Result<()> {
        let prefix = self.prompt("Enter program ID (first few characters): ")?;
        let name = self.prompt("Enter new program name (leave blank to keep current): ")?;
        let description = self.prompt("Enter new description (leave blank to keep current): ")?;

        let update = ProgramUpdate {
            name: keep_if_blank(name),
            description: keep_if_blank(description),
        };
        let result = self.registry.programs().edit(prefix.trim(), &update);
        match result {
            Ok(Some(program)) => {
                self.say(format!("Program updated successfully: {}", program_line(&program)))
            }
            Ok(None) => self.say("Program not found."),
            Err(e) => self.say(format!("Error: {e}")),
        }
    }

    fn delete_program(&mut self) -> io::Result<()> {
        let prefix = self.prompt("Enter program ID to delete (first few characters): ")?;
        let result = self.registry.programs().delete(prefix.trim());
        match result {
            Ok(0) => self.say("Program not found."),
            Ok(n) => self.say(format!("Deleted {n} program(s).")),
            Err(e) => self.say(format!("Error: {e}")),
        }
    }

    // ── Client entries ────────────────────────────────────────────────────

    fn register_client(&mut self) -> io::Result<()> {
        if self.registry.programs().is_empty() {
            return self.say("No programs available yet. Create a program first.");
        }

        let full_name = self.prompt("Enter client's full name: ")?;
        let age_raw = self.prompt("Enter client's age: ")?;
        let Ok(age) = age_raw.trim().parse::<i64>() else {
            return self.say("Error: Age must be a whole number");
        };
        let gender = self.prompt("Enter client's gender (Male/Female/Other): ")?;

        let programs = self.show_program_choices()?;
        let raw = self.prompt("Select programs by numbers (comma-separated, e.g., 1,3): ")?;
        let indices = match parse_selection(&raw, programs.len()) {
            Ok(indices) => indices,
            Err(message) => return self.say(format!("Error: {message}")),
        };
        let program_ids = indices
            .iter()
            .map(|&i| programs[i].program_id.clone())
            .collect();

        let result = self
            .registry
            .clients()
            .register(&full_name, age, &gender, program_ids);
        match result {
            Ok(client) => {
                let summary = self.client_summary(&client);
                self.say(format!("Successfully registered client: {summary}"))
            }
            Err(e) => self.say(format!("Error: {e}")),
        }
    }

    fn view_clients(&mut self) -> io::Result<()> {
        let lines = {
            let (programs, clients) = self.registry.both();
            clients.list(programs.programs())
        };
        self.say("\nRegistered Clients:")?;
        if lines.is_empty() {
            return self.say("No clients registered yet.");
        }
        self.say_numbered(&lines)
    }

    fn view_profile(&mut self) -> io::Result<()> {
        let prefix = self.prompt("Enter client's ID (first few characters are enough): ")?;
        let profile = {
            let (programs, clients) = self.registry.both();
            let directory = ProgramDirectory::new(programs.programs());
            clients
                .get_by_id(prefix.trim())
                .map(|c| ClientProfile::new(c, &directory, &self.timezone))
        };

        let Some(profile) = profile else {
            return self.say("Client not found with that ID.");
        };
        self.say("\nClient Profile:")?;
        self.say(format!("Full Name: {}", profile.full_name))?;
        self.say(format!("Age: {}", profile.age))?;
        self.say(format!("Gender: {}", profile.gender))?;
        self.say(format!("Registered At: {}", profile.registered_at))?;
        self.say(format!(
            "Enrolled Programs: {}",
            join_or(&profile.enrolled_programs, "No programs enrolled")
        ))
    }

    fn search_clients(&mut self) -> io::Result<()> {
        let keyword = self.prompt("Enter name or part of the name to search: ")?;
        let results = {
            let (programs, clients) = self.registry.both();
            clients.search(keyword.trim(), programs.programs())
        };
        if results.is_empty() {
            return self.say("No clients found matching that search term.");
        }
        self.say("\nSearch Results:")?;
        self.say_numbered(&results)
    }

    fn edit_client(&mut self) -> io::Result<()> {
        let prefix = self.prompt("Enter client ID (first few characters): ")?;
        let prefix = prefix.trim().to_string();
        if self.registry.clients().get_by_id(&prefix).is_none() {
            return self.say("Client not found.");
        }

        let full_name = self.prompt("Enter new full name (leave blank to keep current): ")?;
        let age_raw = self.prompt("Enter new age (leave blank to keep current): ")?;
        let age = match keep_if_blank(age_raw).map(|a| a.parse::<i64>()) {
            None => None,
            Some(Ok(age)) => Some(age),
            Some(Err(_)) => return self.say("Error: Age must be a whole number"),
        };
        let gender = self.prompt("Enter new gender (leave blank to keep current): ")?;

        let programs = self.show_program_choices()?;
        let raw = self.prompt(
            "Select programs by numbers (comma-separated) or leave blank to keep current: ",
        )?;
        let program_ids = if raw.trim().is_empty() {
            None
        } else {
            match parse_selection(&raw, programs.len()) {
                Ok(indices) => Some(
                    indices
                        .iter()
                        .map(|&i| programs[i].program_id.clone())
                        .collect(),
                ),
                Err(message) => return self.say(format!("Error: {message}")),
            }
        };

        let update = ClientUpdate {
            full_name: keep_if_blank(full_name),
            age,
            gender: keep_if_blank(gender),
            program_ids,
        };
        let result = self.registry.clients().edit(&prefix, &update);
        match result {
            Ok(Some(client)) => {
                let summary = self.client_summary(&client);
                self.say(format!("Client updated successfully: {summary}"))
            }
            Ok(None) => self.say("Client not found."),
            Err(e) => self.say(format!("Error: {e}")),
        }
    }

    fn delete_client(&mut self) -> io::Result<()> {
        let prefix = self.prompt("Enter client ID to delete (first few characters): ")?;
        let result = self.registry.clients().delete(prefix.trim());
        match result {
            Ok(0) => self.say("Client not found."),
            Ok(n) => self.say(format!("Deleted {n} client(s).")),
            Err(e) => self.say(format!("Error: {e}")),
        }
    }
}

/// Run the gated console on the process's stdin/stdout.
pub fn run_stdio(registry: SharedRegistry, timezone: Tz, secret: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut console = Console::new(registry, timezone, stdin.lock(), stdout.lock());
    console.run_with_gate(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_core::lookup::UNKNOWN_PROGRAM;
    use health_runtime::registry::Registry;
    use tempfile::TempDir;

    fn run_script(registry: &SharedRegistry, script: &str) -> String {
        let mut console = Console::new(registry.clone(), Tz::UTC, script.as_bytes(), Vec::new());
        console.run().unwrap();
        String::from_utf8(console.into_output()).unwrap()
    }

    #[test]
    fn test_menu_choice_parsing() {
        assert_eq!("1".parse::<MenuChoice>(), Ok(MenuChoice::CreateProgram));
        assert_eq!(" 11 ".parse::<MenuChoice>(), Ok(MenuChoice::Exit));
        assert!("0".parse::<MenuChoice>().is_err());
        assert!("12".parse::<MenuChoice>().is_err());
        assert!("abc".parse::<MenuChoice>().is_err());
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("1,3", 3), Ok(vec![0, 2]));
        assert_eq!(parse_selection(" 2 , 2 ", 2), Ok(vec![1, 1]));
        assert_eq!(parse_selection("", 2), Ok(vec![]));
        assert_eq!(
            parse_selection("1,4", 3),
            Err("Invalid program selection: 4".to_string())
        );
        assert!(parse_selection("x", 3).is_err());
        assert!(parse_selection("0", 3).is_err());
    }

    #[test]
    fn test_exit_and_end_of_input() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        assert!(run_script(&registry, "11\n").contains("Goodbye!"));
        assert!(!run_script(&registry, "").contains("Goodbye!"));
    }

    #[test]
    fn test_invalid_choice_reprompts() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let out = run_script(&registry, "42\n11\n");
        assert!(out.contains("Invalid choice. Please enter a number between 1 and 11."));
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn test_create_and_view_programs() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let out = run_script(&registry, "2\n1\nNutrition\nHealthy eating\n2\n11\n");

        assert!(out.contains("No programs available yet."));
        assert!(out.contains("Successfully created: Nutrition ("));
        assert!(out.contains("1. Nutrition ("));
        assert_eq!(registry.programs().len(), 1);
    }

    #[test]
    fn test_create_program_blank_name_reports_error() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let out = run_script(&registry, "1\n   \n\n11\n");
        assert!(out.contains("Error: Program name cannot be empty"));
        assert!(registry.programs().is_empty());
    }

    #[test]
    fn test_register_requires_a_program() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let out = run_script(&registry, "3\n11\n");
        assert!(out.contains("Create a program first."));
    }

    #[test]
    fn test_register_view_and_profile() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        registry.programs().add("Nutrition", "").unwrap();
        registry.programs().add("Fitness", "").unwrap();

        let out = run_script(&registry, "3\nAlice Doe\n30\nfemale\n1,2\n4\n11\n");
        assert!(out.contains("Successfully registered client: Alice Doe (30, Female) - Programs: Nutrition, Fitness"));
        assert!(out.contains("Registered Clients:"));

        let client_id = registry.clients().clients()[0].client_id.clone();
        let out = run_script(&registry, &format!("5\n{}\n11\n", &client_id[..6]));
        assert!(out.contains("Full Name: Alice Doe"));
        assert!(out.contains("Gender: Female"));
        assert!(out.contains("Enrolled Programs: Nutrition, Fitness"));
    }

    #[test]
    fn test_register_rejects_bad_age_and_selection() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        registry.programs().add("Nutrition", "").unwrap();

        let out = run_script(&registry, "3\nBob\nold\n3\nBob\n-1\nmale\n1\n3\nBob\n40\nmale\n7\n11\n");
        assert!(out.contains("Error: Age must be a whole number"));
        assert!(out.contains("Error: Age must be positive"));
        assert!(out.contains("Error: Invalid program selection: 7"));
        assert!(registry.clients().is_empty());
    }

    #[test]
    fn test_profile_not_found() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let out = run_script(&registry, "5\nzzzz\n11\n");
        assert!(out.contains("Client not found with that ID."));
    }

    #[test]
    fn test_search_results() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        registry.clients().register("Nora Smith", 30, "female", vec![]).unwrap();

        let out = run_script(&registry, "6\nsmith\n6\nxyz\n11\n");
        assert!(out.contains("Search Results:"));
        assert!(out.contains("1. Nora Smith (30, Female) - Programs: No programs"));
        assert!(out.contains("No clients found matching that search term."));
    }

    #[test]
    fn test_edit_program_blank_keeps_fields() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let p = registry.programs().add("Yoga", "Stretching").unwrap();

        let out = run_script(&registry, &format!("7\n{}\n\nBreathing\n11\n", &p.program_id[..8]));
        assert!(out.contains("Program updated successfully: Yoga ("));
        let programs = registry.programs();
        assert_eq!(programs.programs()[0].name, "Yoga");
        assert_eq!(programs.programs()[0].description, "Breathing");
    }

    #[test]
    fn test_edit_program_not_found() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let out = run_script(&registry, "7\nnope\nX\n\n11\n");
        assert!(out.contains("Program not found."));
    }

    #[test]
    fn test_delete_program_leaves_unknown_enrollment() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let p = registry.programs().add("Temporary", "").unwrap();
        registry
            .clients()
            .register("Mo", 38, "male", vec![p.program_id.clone()])
            .unwrap();

        let out = run_script(&registry, &format!("8\n{}\n4\n11\n", p.program_id));
        assert!(out.contains("Deleted 1 program(s)."));
        assert!(out.contains(&format!("Programs: {UNKNOWN_PROGRAM}")));
    }

    #[test]
    fn test_blank_delete_prefix_removes_nothing() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        registry.programs().add("Keep me", "").unwrap();
        let out = run_script(&registry, "8\n\n11\n");
        assert!(out.contains("Program not found."));
        assert_eq!(registry.programs().len(), 1);
    }

    #[test]
    fn test_edit_client_blank_answers_keep_everything() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let p = registry.programs().add("Nutrition", "").unwrap();
        let c = registry
            .clients()
            .register("Finn", 33, "male", vec![p.program_id.clone()])
            .unwrap();

        let out = run_script(&registry, &format!("9\n{}\n\n34\n\n\n11\n", &c.client_id[..8]));
        assert!(out.contains("Client updated successfully: Finn (34, Male) - Programs: Nutrition"));
        assert_eq!(registry.clients().clients()[0].program_ids, vec![p.program_id]);
    }

    #[test]
    fn test_edit_client_not_found() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let out = run_script(&registry, "9\nmissing\n11\n");
        assert!(out.contains("Client not found."));
    }

    #[test]
    fn test_delete_client() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let c = registry.clients().register("Gone", 50, "other", vec![]).unwrap();

        let out = run_script(&registry, &format!("10\n{}\n11\n", c.client_id));
        assert!(out.contains("Deleted 1 client(s)."));
        assert!(registry.clients().is_empty());
    }

    #[test]
    fn test_run_with_gate_denies_wrong_secret() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let mut console = Console::new(registry, Tz::UTC, "x\ny\nz\n".as_bytes(), Vec::new());
        assert!(!console.run_with_gate("health123").unwrap());
        let out = String::from_utf8(console.into_output()).unwrap();
        assert!(!out.contains("Health Program Manager"));
    }

    #[test]
    fn test_run_with_gate_opens_menu() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::shared(dir.path());
        let mut console = Console::new(registry, Tz::UTC, "health123\n11\n".as_bytes(), Vec::new());
        assert!(console.run_with_gate("health123").unwrap());
        let out = String::from_utf8(console.into_output()).unwrap();
        assert!(out.contains("Health Program Manager"));
        assert!(out.contains("Goodbye!"));
    }
}
