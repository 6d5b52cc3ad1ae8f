use habit_tracker::models::AppData;
use habit_tracker::{AppConfig, AppState, FileStore, SnapshotStore, router};
use tokio::signal;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env()?;
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let store = FileStore::new(&config.data_dir);
    let data = store.load(&config.workspace).await?;
    info!(
        workspace = %config.workspace,
        habits = data.habits.len(),
        completions = data.completions.len(),
        "snapshot loaded"
    );

    let workspace = config.workspace.clone();
    let _saved = store.subscribe(&config.workspace, move |data: &AppData| {
        debug!(
            workspace = %workspace,
            habits = data.habits.len(),
            completions = data.completions.len(),
            moods = data.moods.len(),
            "snapshot saved"
        );
    });

    let app = router(AppState::new(&config, store, data));
    let addr = config.addr();

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
