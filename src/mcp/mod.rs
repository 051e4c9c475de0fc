//! Minimal MCP (Model Context Protocol) server over stdio.
//!
//! Reads line-delimited JSON-RPC 2.0 from stdin and writes responses to
//! stdout. Exposes the three conversion operations as tools:
//! `convert_md_to_pdf`, `convert_mermaid_to_png` and
//! `convert_mermaid_to_pdf`.
//!
//! Logging goes through `tracing`; the binary points the subscriber at
//! stderr so stdout carries nothing but protocol messages.
//!
//! # Module layout
//!
//! - [`jsonrpc`] — wire types, response helpers, and stdout framing
//! - [`tools`] — tool descriptors, argument checks, and dispatch

pub mod jsonrpc;
pub mod tools;

use crate::config::RenderConfig;
use jsonrpc::{
    invalid_params, method_not_found, parse_error, send_response, success_response,
    IncomingMessage,
};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, BufReader};
use tools::{handle_tools_call, handle_tools_list};
use tracing::{debug, error, info, trace};

/// MCP protocol version.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported during initialization.
pub const SERVER_NAME: &str = "mermaid-pdf-mcp";

/// Handle the `initialize` JSON-RPC request.
pub fn handle_initialize() -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// Run the server on the process's stdin/stdout until stdin closes.
pub async fn run_server(config: &RenderConfig) {
    info!("Starting {} v{}", SERVER_NAME, env!("CARGO_PKG_VERSION"));
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    serve(stdin, &mut stdout, config).await;
    info!("stdin closed, exiting");
}

/// Serve requests read from `reader`, writing responses to `writer`.
///
/// Returns when the reader hits EOF or fails. Requests are handled one at
/// a time; a failing conversion is reported to the client and the loop
/// carries on.
pub async fn serve<R, W>(reader: R, writer: &mut W, config: &RenderConfig)
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Error reading stdin: {}", e);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        trace!("<- {}", trimmed);

        let msg: IncomingMessage = match serde_json::from_str(trimmed) {
            Ok(m) => m,
            Err(e) => {
                debug!("Parse error: {}", e);
                send_response(writer, &parse_error()).await;
                continue;
            }
        };

        let Some(method) = msg.method.as_deref() else {
            debug!("Ignoring message without method");
            continue;
        };

        // Notifications carry no id and get no response.
        let Some(id) = msg.id else {
            debug!("Notification: {}", method);
            continue;
        };

        let response = match method {
            "initialize" => success_response(id, handle_initialize()),
            "ping" => success_response(id, serde_json::json!({})),
            "tools/list" => success_response(id, handle_tools_list()),
            "tools/call" => match msg.params {
                Some(ref params) => success_response(id, handle_tools_call(params, config).await),
                None => invalid_params(id, "Missing params for tools/call"),
            },
            _ => method_not_found(id, method),
        };

        send_response(writer, &response).await;
    }
}
