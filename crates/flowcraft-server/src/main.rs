//! ABOUTME: Process entrypoint — loads config and serves the axum router
//! ABOUTME: until shutdown; the actual wiring lives in `flowcraft_server::startup`

use flowcraft_config::FlowcraftConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("flowcraft-server: startup failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = FlowcraftConfig::load(None).await?;
    init_tracing(&config);
    flowcraft_server::serve(&config).await
}

fn init_tracing(config: &FlowcraftConfig) {
    let filter = EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
