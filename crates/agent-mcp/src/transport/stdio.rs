use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};

use super::{McpTransport, TransportKind, into_result};
use crate::error::{McpError, Result};
use crate::protocol::{JsonRpcId, JsonRpcMessage, JsonRpcRequest};

type Pending = Arc<Mutex<HashMap<i64, oneshot::Sender<Result<Value>>>>>;

/// Spawned tool server speaking newline-delimited JSON-RPC.
///
/// The child lives as long as the transport and is killed on drop. A
/// writer task owns stdin, a reader task owns stdout and routes responses
/// to waiting callers by id. A caller that gives up simply drops its
/// receiver; the late response is discarded.
pub struct StdioTransport {
    command: String,
    write_tx: mpsc::Sender<String>,
    pending: Pending,
    next_id: AtomicI64,
    alive: Arc<AtomicBool>,
    timeout: Duration,
    child: Child,
}

impl StdioTransport {
    pub fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group: a terminal Ctrl-C aimed at the console must not
        // reach the server.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| McpError::Spawn {
            command: command.to_string(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Protocol("child stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Protocol("child stdout unavailable".into()))?;

        let alive = Arc::new(AtomicBool::new(true));
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));

        let (write_tx, mut write_rx) = mpsc::channel::<String>(64);
        let alive_writer = Arc::clone(&alive);
        let mut stdin = stdin;
        tokio::spawn(async move {
            while let Some(line) = write_rx.recv().await {
                let written = async {
                    stdin.write_all(line.as_bytes()).await?;
                    stdin.flush().await
                };
                if let Err(e) = written.await {
                    tracing::warn!(error = %e, "Tool server stdin closed");
                    alive_writer.store(false, Ordering::SeqCst);
                    break;
                }
            }
        });

        let pending_reader = Arc::clone(&pending);
        let alive_reader = Arc::clone(&alive);
        let server = command.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => route_line(&pending_reader, &server, &line),
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(server = %server, error = %e, "Tool server stdout read failed");
                        break;
                    }
                }
            }
            alive_reader.store(false, Ordering::SeqCst);
            // Wake every waiter with ConnectionClosed by dropping the senders.
            if let Ok(mut waiting) = pending_reader.lock() {
                waiting.clear();
            }
        });

        if let Some(stderr) = child.stderr.take() {
            let server = command.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(server = %server, "{line}");
                }
            });
        }

        let transport = Self {
            command: command.to_string(),
            write_tx,
            pending,
            next_id: AtomicI64::new(1),
            alive,
            timeout,
            child,
        };
        tracing::debug!(command, pid = ?transport.pid(), "Spawned tool server");
        Ok(transport)
    }

    /// OS process id of the server, while it is running
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn send_line(&self, message: &JsonRpcRequest) -> Result<()> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(McpError::ConnectionClosed);
        }
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        self.write_tx
            .send(line)
            .await
            .map_err(|_| McpError::ConnectionClosed)
    }

    fn forget(&self, id: i64) {
        if let Ok(mut waiting) = self.pending.lock() {
            waiting.remove(&id);
        }
    }
}

fn route_line(pending: &Pending, server: &str, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    match serde_json::from_str::<JsonRpcMessage>(line) {
        Ok(JsonRpcMessage::Response(response)) => {
            let Some(JsonRpcId::Number(id)) = response.id else {
                tracing::warn!(server, "Response without a numeric id ignored");
                return;
            };
            let waiter = pending.lock().ok().and_then(|mut w| w.remove(&id));
            match waiter {
                Some(tx) => {
                    let _ = tx.send(into_result(response));
                }
                None => tracing::debug!(server, id, "Late response discarded"),
            }
        }
        Ok(JsonRpcMessage::Request(request)) => {
            tracing::debug!(server, method = %request.method, "Ignoring server-initiated message");
        }
        Err(e) => {
            tracing::warn!(server, error = %e, "Unparsable line from tool server");
        }
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|_| McpError::Protocol("pending table poisoned".into()))?
            .insert(id, tx);

        let request = JsonRpcRequest::new(JsonRpcId::Number(id), method, params);
        if let Err(e) = self.send_line(&request).await {
            self.forget(id);
            return Err(e);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(McpError::ConnectionClosed),
            Err(_) => {
                self.forget(id);
                Err(McpError::Timeout(self.timeout))
            }
        }
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        self.send_line(&JsonRpcRequest::notification(method, params))
            .await
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Stdio
    }

    fn endpoint(&self) -> &str {
        &self.command
    }
}
