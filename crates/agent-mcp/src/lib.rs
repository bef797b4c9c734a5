//! # agent-mcp
//!
//! Tool-call wire protocol for the research agent.
//!
//! ```text
//! ┌──────────────────────┐   stdio / HTTP   ┌────────────────────────┐
//! │  MultiServerClient   │ ───────────────> │      ToolServer        │
//! │  (RemoteTool x N)    │  JSON-RPC 2.0    │  (ToolRegistry)        │
//! └──────────────────────┘ <─────────────── └────────────────────────┘
//! ```
//!
//! The server half wraps any [`agent_core::ToolRegistry`]; the client half
//! turns every remote tool back into an [`agent_core::Tool`], so the
//! reasoning loop never knows where a tool actually runs.

pub mod client;
pub mod error;
pub mod http;
pub mod protocol;
pub mod server;
pub mod transport;

pub use client::{ClientConfig, MultiServerClient, RemoteTool, ServerConfig};
pub use error::{McpError, Result};
pub use server::ToolServer;
pub use transport::{HttpTransport, McpTransport, StdioTransport, TransportConfig, TransportKind};
