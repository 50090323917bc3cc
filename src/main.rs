use anyhow::Context;

use evbook::{
    app,
    config::{AppConfig, LogFormat},
    state::AppState,
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init(LogFormat::from_env()?);

    let config = AppConfig::from_env().context("load configuration")?;
    let state = AppState::init(&config)
        .await
        .context("initialise application state")?;
    app::serve(&config.server, app::build_app(state)).await
}
