// Globetrotter entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Build the HTTP quiz client
// 4. Spawn the session actor
// 5. Run the TUI until the player quits
// 6. Shut the session actor down

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use globetrotter_api::HttpQuizService;
use globetrotter_app::{config, SessionOptions};
use globetrotter_core::QuizService;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use globetrotter_tui::tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    let log_path = init_tracing()?;
    info!("Globetrotter starting up (logging to {})", log_path.display());

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    let user_id = config.player.user_id();
    info!(
        "Config loaded: {} rounds per game, backend {}",
        config.game.max_rounds, config.service.base_url
    );
    if user_id.is_none() {
        warn!("No player identity configured; games cannot be started");
    }

    // 3. Build the HTTP quiz client
    let service = HttpQuizService::new(
        &config.service.base_url,
        config.service.request_timeout(),
    )
    .context("failed to build HTTP client")?;
    let service: Arc<dyn QuizService> = Arc::new(service);

    // 4. Spawn the session actor
    let (ui_tx, ui_rx) = mpsc::channel(64);
    let (handle, actor_task) = globetrotter_app::spawn(
        service,
        SessionOptions::new(config.game.max_rounds).with_ui(ui_tx),
    );

    // 5. Run the TUI (blocks until the player quits)
    if let Err(e) = tui::run(ui_rx, handle.clone(), user_id, config.game.max_rounds).await {
        error!("TUI error: {}", e);
    }

    // 6. Cleanup: stop the actor (with timeout)
    handle.shutdown().await;
    let _ = tokio::time::timeout(Duration::from_secs(5), actor_task).await;

    info!("Globetrotter shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (the terminal belongs to the TUI).
///
/// Returns the path of the log file.
fn init_tracing() -> anyhow::Result<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = directories::ProjectDirs::from("", "", "globetrotter")
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"));
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_path = log_dir.join("globetrotter.log");
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("failed to create log file {}", log_path.display()))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("globetrotter=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(log_path)
}
