//! Minimal JSON-RPC 2.0 over HTTP, shared by the chain adapter and wallet bridges.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// JSON-RPC client bound to one endpoint.
#[derive(Debug)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        // No system proxy lookup (avoids SCDynamicStore panics in sandboxes).
        let http = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Calls `method` and returns the `result` member (may be JSON `null`).
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        let resp = self.http.post(&self.url).json(&body).send().await?;
        let json: Value = resp.json().await?;
        if let Some(err) = json.get("error") {
            let msg = err
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(RpcError::Rpc(msg));
        }
        json.get("result")
            .cloned()
            .ok_or_else(|| RpcError::Decode("Missing result".into()))
    }
}

/// `0x`-prefixed hex string to bytes.
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>, RpcError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|e| RpcError::Decode(e.to_string()))
}

/// Bytes to a `0x`-prefixed hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_accepts_missing_prefix() {
        assert_eq!(parse_hex_bytes("0x0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert_eq!(parse_hex_bytes("0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert_eq!(to_hex(&[0xde, 0xad]), "0xdead");
        assert!(parse_hex_bytes("0xzz").is_err());
    }
}
