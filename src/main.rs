mod app;
mod auth;
mod config;
mod db;
mod error;
mod state;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "userauth=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr();

    let app_state = match AppState::init(config).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = ?e, "startup failed");
            return Err(e);
        }
    };

    app::serve(app::build_app(app_state), &addr).await
}
