//! Connector search service entry point.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use connector_search::Dependencies;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting connector search service");

    let mut deps = match Dependencies::new().await {
        Ok(deps) => deps,
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            std::process::exit(1);
        }
    };

    if let Err(e) = deps.orchestrator.run().await {
        error!(error = %e, "Orchestrator failed");
        std::process::exit(1);
    }

    info!("Connector search service stopped");
}
