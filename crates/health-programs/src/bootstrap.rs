use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use health_core::settings::{app_dir, Settings};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.health-programs/`, its `logs/` subdirectory and `data_dir` exist.
pub fn ensure_directories(data_dir: &Path) -> anyhow::Result<()> {
    let app = app_dir();
    std::fs::create_dir_all(&app)?;
    std::fs::create_dir_all(app.join("logs"))?;
    std::fs::create_dir_all(data_dir)?;
    Ok(())
}

/// Where log output goes.
///
/// An explicit `--log-file` always wins. Otherwise the console modes log to
/// `~/.health-programs/logs/health-programs.log` so the menu is not
/// interleaved with log lines, and the API-only mode logs to stderr (`None`).
pub fn resolve_log_file(settings: &Settings) -> Option<PathBuf> {
    if let Some(path) = &settings.log_file {
        return Some(path.clone());
    }
    match settings.mode.as_str() {
        "api" => None,
        _ => Some(app_dir().join("logs").join("health-programs.log")),
    }
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI log level name to a tracing filter directive.
fn filter_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Writes to `log_file` (appending, no ANSI colours) when given, otherwise to
/// stderr.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, stderr_layer) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(std::sync::Mutex::new(file));
            (Some(layer), None)
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr);
            (None, Some(layer))
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
