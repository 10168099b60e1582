use std::sync::Arc;

use feature_assist::channels::CliChannel;
use feature_assist::config::AppConfig;
use feature_assist::error::Result;
use feature_assist::session::{SessionStore, feature_routes, spawn_sweep_task};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;
    let addr = config.socket_addr();

    eprintln!("📝 Feature Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Chat API: http://{}/chat", addr);
    eprintln!("   Reset API: http://{}/reset", addr);
    eprintln!(
        "   Sessions: idle timeout {}s, sweep every {}s",
        config.session_idle_timeout.as_secs(),
        config.sweep_interval.as_secs()
    );

    // ── Sessions ─────────────────────────────────────────────────────────
    let store = SessionStore::new();
    let _sweep_handle = spawn_sweep_task(
        Arc::clone(&store),
        config.sweep_interval,
        config.session_idle_timeout,
    );

    // ── HTTP ─────────────────────────────────────────────────────────────
    let app = feature_routes(Arc::clone(&store));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Feature Assist server started");

    if !config.cli_enabled {
        axum::serve(listener, app).await?;
        return Ok(());
    }

    // ── CLI ──────────────────────────────────────────────────────────────
    eprintln!("   CLI: enabled (/reset to start over, /quit to exit)\n");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "HTTP server stopped");
        }
    });

    CliChannel::new().run(store).await?;
    Ok(())
}
