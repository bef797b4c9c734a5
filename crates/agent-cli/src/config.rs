//! Console configuration
//!
//! Everything comes from the environment (after `.env` is loaded). The tool
//! server list defaults to the sibling binaries of this executable plus the
//! weather server's HTTP endpoint, and can be replaced by a JSON file named
//! in `MCP_SERVERS_CONFIG`.

use std::path::{Path, PathBuf};

use agent_core::AgentConfig;
use agent_core::reasoning::DEFAULT_MAX_ROUNDS;
use agent_mcp::{ClientConfig, ServerConfig};
use anyhow::Context;

const DEFAULT_WEATHER_ADDR: &str = "127.0.0.1:8000";

#[derive(Clone, Debug)]
pub struct CliConfig {
    pub agent: AgentConfig,
    pub client: ClientConfig,
}

impl CliConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bin_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_lookup(|key| std::env::var(key).ok(), &bin_dir)
    }

    /// Build from any key lookup; `bin_dir` is where the stdio servers live
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        bin_dir: &Path,
    ) -> anyhow::Result<Self> {
        let mut agent = AgentConfig::default();
        if let Some(model) = lookup("GROQ_MODEL").filter(|m| !m.trim().is_empty()) {
            agent.generation.model = model;
        }
        if let Some(raw) = lookup("AGENT_TEMPERATURE") {
            agent.generation.temperature = raw
                .parse()
                .with_context(|| format!("AGENT_TEMPERATURE must be a number, got '{raw}'"))?;
        }
        agent.max_rounds = match lookup("AGENT_MAX_ROUNDS") {
            Some(raw) => raw
                .parse()
                .ok()
                .filter(|&n: &usize| n > 0)
                .with_context(|| format!("AGENT_MAX_ROUNDS must be a positive integer, got '{raw}'"))?,
            None => DEFAULT_MAX_ROUNDS,
        };

        let mut client = match lookup("MCP_SERVERS_CONFIG") {
            Some(path) => ClientConfig::load(&path)?,
            None => {
                let weather_addr =
                    lookup("WEATHER_SERVER_ADDR").unwrap_or_else(|| DEFAULT_WEATHER_ADDR.into());
                ClientConfig::new(default_servers(bin_dir, &weather_addr))
            }
        };
        if let Some(raw) = lookup("AGENT_REQUEST_TIMEOUT_SECS") {
            client.request_timeout_secs = raw.parse().with_context(|| {
                format!("AGENT_REQUEST_TIMEOUT_SECS must be a whole number, got '{raw}'")
            })?;
        }

        Ok(Self { agent, client })
    }
}

/// Web search and papers over stdio, weather over HTTP
pub fn default_servers(bin_dir: &Path, weather_addr: &str) -> Vec<ServerConfig> {
    let binary = |name: &str| {
        bin_dir
            .join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
            .to_string_lossy()
            .into_owned()
    };

    vec![
        ServerConfig::stdio("web_search", binary("websearch-server")),
        ServerConfig::http("weather", format!("http://{weather_addr}/mcp")),
        ServerConfig::stdio("papers", binary("papers-server")),
    ]
}
