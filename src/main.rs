use anyhow::Context;
use tabletalk::{AppState, app, config::Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tabletalk=info,tower_http=info")),
        )
        .init();

    if config.google_api_key.is_none() {
        info!("GOOGLE_API_KEY not set, scene generation is disabled");
    }

    let state = AppState::new(&config);
    let app = app(&config, state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("cannot bind {}", config.addr))?;
    info!(addr = %config.addr, upload_dir = %config.upload_dir.display(), "table server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
