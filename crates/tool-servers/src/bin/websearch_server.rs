//! Web search tool server (stdio)

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tool_servers::init("info");

    let server = tool_servers::websearch_server()?;
    server.serve_stdio().await?;
    Ok(())
}
