mod bootstrap;

use anyhow::Result;
use chrono_tz::Tz;
use health_core::settings::Settings;
use health_core::time_utils::resolve_timezone;
use health_runtime::api::{self, ApiState};
use health_runtime::registry::{Registry, SharedRegistry};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();
    let data_dir = settings.data_dir();

    bootstrap::ensure_directories(&data_dir)?;
    let log_file = bootstrap::resolve_log_file(&settings);
    bootstrap::setup_logging(&settings.log_level, log_file.as_deref())?;

    tracing::info!("Health Programs v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Mode: {}, Data: {}, Timezone: {}",
        settings.mode,
        data_dir.display(),
        settings.timezone
    );

    let timezone = resolve_timezone(&settings.timezone);
    let registry = Registry::shared(&data_dir);
    for path in registry.unreadable_stores() {
        eprintln!(
            "Warning: could not read {}. Starting with an empty list; the file will be kept as {}.corrupt on the first change.",
            path.display(),
            path.display()
        );
    }

    match settings.mode.as_str() {
        "console" => {
            run_console(registry.clone(), timezone, settings.password.clone()).await?;
        }

        "api" => {
            let listener = TcpListener::bind(settings.bind).await?;
            let state = ApiState::new(registry.clone(), timezone);
            api::serve(listener, state, async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Ctrl+C received; stopping HTTP API");
                }
            })
            .await?;
        }

        "both" => {
            let listener = TcpListener::bind(settings.bind).await?;
            let state = ApiState::new(registry.clone(), timezone);
            let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

            // The API lives exactly as long as the console session.
            let server = tokio::spawn(api::serve(listener, state, async move {
                let _ = stop_rx.await;
            }));

            let console_result = run_console(registry.clone(), timezone, settings.password.clone()).await;

            let _ = stop_tx.send(());
            server.await??;
            console_result?;
        }

        unknown => {
            eprintln!("Unknown mode: {}", unknown);
        }
    }

    registry.close();
    tracing::info!("Health Programs stopped");
    Ok(())
}

/// Run the stdin/stdout menu on a blocking thread.
async fn run_console(registry: SharedRegistry, timezone: Tz, password: String) -> Result<()> {
    let granted = tokio::task::spawn_blocking(move || health_console::run_stdio(registry, timezone, &password)).await??;
    if !granted {
        tracing::warn!("console session ended without access");
    }
    Ok(())
}
