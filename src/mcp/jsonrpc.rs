//! JSON-RPC 2.0 wire types and response helpers.
//!
//! The minimal set needed for an MCP server over stdio: incoming message
//! deserialisation, outgoing response serialisation, the standard error
//! constructors, and newline framing on the way out.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{error, trace};

// ── Wire types ───────────────────────────────────────────────────────────

/// An incoming JSON-RPC 2.0 message from the client.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

/// An outgoing JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ── Response constructors ────────────────────────────────────────────────

pub fn success_response(id: Value, result: Value) -> Response {
    Response {
        jsonrpc: "2.0",
        result: Some(result),
        error: None,
        id,
    }
}

fn error_response(id: Value, code: i64, message: String) -> Response {
    Response {
        jsonrpc: "2.0",
        result: None,
        error: Some(RpcError {
            code,
            message,
            data: None,
        }),
        id,
    }
}

pub fn method_not_found(id: Value, method: &str) -> Response {
    error_response(id, -32601, format!("Method not found: {method}"))
}

pub fn invalid_params(id: Value, message: impl Into<String>) -> Response {
    error_response(id, -32602, message.into())
}

pub fn parse_error() -> Response {
    error_response(Value::Null, -32700, "Parse error".to_string())
}

// ── I/O helper ───────────────────────────────────────────────────────────

/// Write a response as a single newline-terminated line and flush.
///
/// Write failures are logged; the caller decides whether a broken stdout
/// ends the loop (it does, on the next read returning EOF).
pub async fn send_response<W: AsyncWrite + Unpin>(out: &mut W, response: &Response) {
    let mut line = match serde_json::to_string(response) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialise response: {}", e);
            return;
        }
    };
    trace!("-> {}", line);
    line.push('\n');

    if let Err(e) = out.write_all(line.as_bytes()).await {
        error!("Failed to write response: {}", e);
        return;
    }
    if let Err(e) = out.flush().await {
        error!("Failed to flush response: {}", e);
    }
}
