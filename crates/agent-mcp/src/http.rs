//! HTTP endpoint for a [`ToolServer`]
//!
//! `POST /mcp` takes a JSON-RPC message (or batch) and answers with JSON.
//! Notifications are acknowledged with `202 Accepted`. The `initialize`
//! response carries a fresh `Mcp-Session-Id` header.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::protocol::JsonRpcRequest;
use crate::server::ToolServer;

/// Path the endpoint is mounted on
pub const MCP_PATH: &str = "/mcp";

const SESSION_HEADER: &str = "mcp-session-id";

/// Build the router for a tool server
pub fn router(server: ToolServer) -> Router {
    Router::new()
        .route(MCP_PATH, post(handle_post).get(handle_get))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(server))
}

async fn handle_post(State(server): State<Arc<ToolServer>>, body: String) -> Response {
    let opens_session = serde_json::from_str::<JsonRpcRequest>(&body)
        .is_ok_and(|request| request.method == "initialize");

    match server.handle_raw(&body).await {
        Some(response) if opens_session => {
            let session = uuid::Uuid::new_v4().simple().to_string();
            tracing::debug!(session = %session, "Session opened");
            ([(SESSION_HEADER, session)], Json(response)).into_response()
        }
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Server-initiated streams are not offered
async fn handle_get() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(server: ToolServer, addr: SocketAddr) -> Result<()> {
    let name = server.info().name.clone();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(server = %name, "Listening on http://{}{}", listener.local_addr()?, MCP_PATH);

    axum::serve(listener, router(server))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!(server = %name, "Shut down");
    Ok(())
}
