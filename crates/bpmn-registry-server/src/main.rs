use anyhow::{Context, Result};
use bpmn_registry_server::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from .env and environment variables
    let config = ServerConfig::load()
        .context("Failed to load configuration")?;

    // Run the server using the library's run function
    bpmn_registry_server::run(config).await
        .context("Server error")?;

    Ok(())
}
