use finance_dialog_orchestrator::{
    api::start_server,
    engine::DialogEngine,
    enrich::DucklingClient,
    finance::{self, BANKING_FLOW_CONFIG},
    nlu::HttpNluClient,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let nlu = Arc::new(HttpNluClient::from_env());
    let duckling = Arc::new(DucklingClient::from_env());
    let registries = finance::build_registries(duckling);

    let config_path = std::env::var("FLOW_CONFIG_PATH")
        .unwrap_or_else(|_| BANKING_FLOW_CONFIG.to_string());
    let engine = Arc::new(DialogEngine::from_file(&config_path, nlu, registries)?);

    info!(%port, "Starting dialog API server");
    start_server(engine, port).await?;

    Ok(())
}
