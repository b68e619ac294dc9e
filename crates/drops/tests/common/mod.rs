//! Common helpers for integration tests.
//! Some helpers are only used by specific test binaries; allow dead_code to avoid per-binary warnings.
#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("drops=debug".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

/// One request seen by [MockServer].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path plus query string, still percent-encoded.
    pub target: String,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

pub type Handler = dyn Fn(&Recorded) -> (u16, String) + Send + Sync;

/// Local HTTP server on an ephemeral port; answers every request with `handler`.
pub struct MockServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start<F>(handler: F) -> Result<Self>
    where
        F: Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.context("bind mock server")?;
        let url = format!("http://{}", listener.local_addr()?);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);
        let seen = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = Arc::clone(&handler);
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    if let Err(e) = serve_one(stream, handler, seen).await {
                        eprintln!("mock server: {}", e);
                    }
                });
            }
        });
        Ok(Self { url, requests, task })
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// JSON-RPC method names received, in order.
    pub fn rpc_methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.json().get("method").and_then(|m| m.as_str()).map(str::to_string))
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_one(
    mut stream: TcpStream,
    handler: Arc<Handler>,
    seen: Arc<Mutex<Vec<Recorded>>>,
) -> Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            anyhow::bail!("connection closed before headers");
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let recorded = Recorded { method, target, body };
    let (status, response_body) = handler(&recorded);
    seen.lock().unwrap().push(recorded);

    let response = format!(
        "HTTP/1.1 {} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        response_body.len(),
        response_body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// JSON-RPC success envelope.
pub fn rpc_result(req: &Value, result: Value) -> String {
    json!({"jsonrpc": "2.0", "id": req.get("id").cloned().unwrap_or(json!(1)), "result": result}).to_string()
}

/// JSON-RPC error envelope.
pub fn rpc_error(req: &Value, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": req.get("id").cloned().unwrap_or(json!(1)),
        "error": {"code": 3, "message": message}
    })
    .to_string()
}

/// Content API success envelope.
pub fn content_result(result: Value) -> String {
    json!({"ms": 1, "query": "...", "result": result}).to_string()
}
