use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Name of the per-user directory holding settings, logs and the default stores.
pub const APP_DIR_NAME: &str = ".health-programs";

/// Root of the per-user application directory (`~/.health-programs`).
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Default location of `programs.json` and `clients.json`.
pub fn default_data_dir() -> PathBuf {
    app_dir().join("data")
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Manage health programs and enrolled clients
#[derive(Parser, Debug, Clone)]
#[command(
    name = "health-programs",
    about = "Manage health programs and enrolled clients",
    version
)]
pub struct Settings {
    /// Which surface to run
    #[arg(long, default_value = "console", value_parser = ["console", "api", "both"])]
    pub mode: String,

    /// Directory holding programs.json and clients.json
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Address the HTTP API listens on
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Timezone used to display timestamps (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Shared secret required by the interactive console
    #[arg(long, env = "HEALTH_PROGRAMS_PASSWORD", default_value = "health123", hide_env_values = true)]
    pub password: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.health-programs/last_used.json`.
///
/// The password is never persisted.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<SocketAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl LastUsedParams {
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(APP_DIR_NAME).join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if settings.data_dir.is_none() {
            settings.data_dir = last.data_dir;
        }
        if !is_arg_explicitly_set(&matches, "bind") {
            if let Some(v) = last.bind {
                settings.bind = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!(error = %e, "could not persist last-used settings");
        }

        settings
    }

    /// Directory holding the collection stores.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }

        if settings.data_dir.is_none() {
            settings.data_dir = Some(default_data_dir());
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }
}

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_dir: s.data_dir.clone(),
            bind: Some(s.bind),
            timezone: Some(s.timezone.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            data_dir: Some(PathBuf::from("/srv/health")),
            bind: Some("0.0.0.0:8080".parse().unwrap()),
            timezone: Some("Africa/Nairobi".to_string()),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.data_dir, Some(PathBuf::from("/srv/health")));
        assert_eq!(loaded.bind, Some("0.0.0.0:8080".parse().unwrap()));
        assert_eq!(loaded.timezone, Some("Africa/Nairobi".to_string()));
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert!(LastUsedParams::load_from(&path).bind.is_none());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{{{").unwrap();
        assert!(LastUsedParams::load_from(&path).timezone.is_none());
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams::default().save_to(&path).expect("save");
        assert!(path.exists());
        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["health-programs"]);
        assert_eq!(settings.mode, "console");
        assert!(settings.data_dir.is_none());
        assert_eq!(settings.bind, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.timezone, "auto");
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_mode_and_bind() {
        let settings =
            Settings::parse_from(["health-programs", "--mode", "api", "--bind", "0.0.0.0:9000"]);
        assert_eq!(settings.mode, "api");
        assert_eq!(settings.bind.port(), 9000);
    }

    #[test]
    fn test_settings_rejects_unknown_mode() {
        let result = Settings::try_parse_from(["health-programs", "--mode", "gui"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_cli_password() {
        let settings = Settings::parse_from(["health-programs", "--password", "s3cret"]);
        assert_eq!(settings.password, "s3cret");
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            data_dir: Some(tmp.path().join("stores")),
            bind: Some("127.0.0.1:7000".parse().unwrap()),
            timezone: Some("UTC".to_string()),
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["health-programs".into()], &config_path);
        assert_eq!(settings.data_dir(), tmp.path().join("stores"));
        assert_eq!(settings.bind.port(), 7000);
        assert_eq!(settings.timezone, "UTC");
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            timezone: Some("UTC".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["health-programs".into(), "--timezone".into(), "Asia/Tokyo".into()],
            &config_path,
        );
        assert_eq!(settings.timezone, "Asia/Tokyo");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams::default().save_to(&config_path).expect("save");

        Settings::load_with_last_used_impl(
            vec!["health-programs".into(), "--clear".into()],
            &config_path,
        );
        assert!(!config_path.exists(), "file must be gone after --clear");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = Settings::load_with_last_used_impl(
            vec!["health-programs".into(), "--debug".into()],
            &tmp_config_path(&tmp),
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_without_password() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        Settings::load_with_last_used_impl(
            vec![
                "health-programs".into(),
                "--password".into(),
                "topsecret".into(),
                "--timezone".into(),
                "UTC".into(),
            ],
            &config_path,
        );

        let content = std::fs::read_to_string(&config_path).expect("persisted");
        assert!(!content.contains("topsecret"));
        assert_eq!(LastUsedParams::load_from(&config_path).timezone, Some("UTC".to_string()));
    }
}
