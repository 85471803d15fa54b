mod bootstrap;
mod health;
mod webhook;

use anyhow::Result;
use modista_core::config::{AppConfig, LoadOptions};
use tracing::{info, warn};

fn init_logging(config: &AppConfig) {
    use modista_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
    )
    .await?;

    // The Bot API only accepts https webhook endpoints; without one the
    // server still comes up and serves the endpoint unregistered.
    let registration_url = app.config.telegram.registration_url();
    match &registration_url {
        Some(url) => {
            app.bot.set_webhook(url, &app.config.telegram.webhook_secret, true).await?;
            info!(event_name = "system.server.webhook_registered", url = %url, "webhook registered");
        }
        None => {
            warn!(
                event_name = "system.server.webhook_unregistered",
                "no public https base URL resolved; webhook registration skipped"
            );
        }
    }

    let state = webhook::WebhookState {
        message_router: app.message_router.clone(),
        sink: app.bot.clone(),
        secret: app.config.telegram.webhook_secret.clone(),
    };
    let router = webhook::router(&app.config.telegram.webhook_path, state);

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(event_name = "system.server.started", bind_address = %address, "modista-server started");

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    info!(event_name = "system.server.stopping", "modista-server stopping");
    if registration_url.is_some() {
        if let Err(api_error) = app.bot.delete_webhook(false).await {
            warn!(
                event_name = "system.server.webhook_delete_failed",
                error = %api_error,
                "could not delete webhook during shutdown"
            );
        }
    }

    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
