use std::time::Duration;

use gaam_backend::{account::manage, config::Config, router, Global};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// How often expired sessions are dropped.
const PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()?;

    let path = std::env::var("GAAM_CONFIG").unwrap_or_else(|_| "./data/config.toml".to_owned());
    let config = Config::load_or_default(&path)?;
    let addr = config.server.addr;

    let global = Global::from_config(config)?;
    manage::bootstrap_super_admin(&global)?;

    let sessions = global.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                tracing::debug!("purged {purged} expired sessions");
            }
        }
    });

    tracing::info!("listening on {addr}");
    axum::Server::bind(&addr)
        .serve(router(global).into_make_service())
        .await?;
    Ok(())
}
