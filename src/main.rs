use anyhow::{Context, Result};
use aqi_forecast::{AppState, AqiConfig, regression, telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AqiConfig::load()?;
    telemetry::init(&config.logging)?;

    let model = regression::load_model(&config.model.path, config.model.input_width)
        .with_context(|| format!("Failed to load AQI model from {}", config.model.path.display()))?;

    let state = AppState::from_config(&config, model)?;
    web::run(&config.server, state).await
}
