//! Research paper tool server (stdio)

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tool_servers::init("info");

    let server = tool_servers::papers_server()?;
    server.serve_stdio().await?;
    Ok(())
}
