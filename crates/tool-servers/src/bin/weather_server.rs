//! Weather tool server (HTTP)

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tool_servers::init("info,tower_http=debug");

    if std::env::var("OPENWEATHERMAP_API_KEY").is_err() {
        tracing::warn!("OPENWEATHERMAP_API_KEY not set - every lookup will report it");
    }

    let server = tool_servers::weather_server()?;
    let addr = tool_servers::weather_addr()?;
    agent_mcp::http::serve(server, addr).await?;
    Ok(())
}
