//! research-agent
//!
//! Interactive console: discovers tools from the configured servers, wires
//! them to a Groq-hosted model and answers questions until `exit`.

mod config;
mod console;

use std::sync::Arc;

use agent_core::{AgentBuilder, AgentSession, LlmProvider};
use agent_mcp::MultiServerClient;
use agent_runtime::GroqProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with the console
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = CliConfig::from_env()?;
    let provider = Arc::new(GroqProvider::from_env()?);

    // Discover tools; unreachable servers are skipped
    let mut client = MultiServerClient::new(config.client.clone());
    let tools = client.discover().await;
    tracing::info!(
        servers = ?client.connected_servers(),
        tools = tools.len(),
        "Tool discovery finished"
    );
    for schema in &tools {
        tracing::debug!(tool = %schema.name, "Tool available");
    }
    if tools.is_empty() {
        tracing::warn!("No tool servers reachable; answering without tools");
    }

    match provider.health_check().await {
        Ok(true) => tracing::info!(provider = provider.name(), "Model endpoint reachable"),
        Ok(false) | Err(_) => {
            tracing::warn!(provider = provider.name(), "Model endpoint not reachable; turns will fail");
        }
    }

    let agent = AgentBuilder::new()
        .provider(provider)
        .tools(client.registry())
        .config(config.agent)
        .build()?;
    let session = AgentSession::new(agent);

    print!("{}", console::banner());
    console::run(&session).await?;

    tracing::info!(turns = session.turns(), "Session ended");
    Ok(())
}
