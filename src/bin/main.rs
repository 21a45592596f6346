use finance_dialog_orchestrator::{
    engine::DialogEngine,
    enrich::DucklingClient,
    finance::{self, BANKING_FLOW_CONFIG},
    nlu::HttpNluClient,
};
use std::io::{self, BufRead, Write};
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

    info!("Finance dialog orchestrator starting");

    let nlu = Arc::new(HttpNluClient::from_env());
    let duckling = Arc::new(DucklingClient::from_env());
    let registries = finance::build_registries(duckling);

    let config_path = std::env::var("FLOW_CONFIG_PATH")
        .unwrap_or_else(|_| BANKING_FLOW_CONFIG.to_string());
    let engine = DialogEngine::from_file(&config_path, nlu, registries)?;

    let mut context = engine.start_session();
    info!(session_id = %context.session_id(), "Session started");

    println!("--- Personal Finance Assistant (type 'exit' to quit) ---");

    // Initial greeting straight from the start state's template.
    if let Some(greeting) = engine
        .config()
        .state(&context.current_state)
        .and_then(|state| state.response_template.clone())
    {
        println!("Bot: {}", greeting);
    }

    let stdin = io::stdin();
    loop {
        print!("User: ");
        io::stdout().flush()?;

        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line?;
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        match engine.process_turn(input, &mut context).await {
            Ok(reply) => println!("Bot: {}", reply),
            Err(e) => eprintln!("Turn failed: {}", e),
        }
    }

    Ok(())
}
