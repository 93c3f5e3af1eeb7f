//! MCP over stdio: newline-delimited JSON-RPC 2.0, one request at a time.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{AnyDelimiterCodec, FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, warn};

use crate::config::Config;
use rpc::{METHOD_NOT_FOUND, PARSE_ERROR, jsonrpc_error, jsonrpc_result};

mod project;
mod resources;
mod rpc;
mod tools;

#[cfg(test)]
mod fake_server;

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "mcp-sst";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn serve<R, W>(reader: R, writer: W, config: &Config) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // Frames stay raw bytes so a non-UTF-8 line is answered, not fatal.
    let framing = AnyDelimiterCodec::new(b"\n".to_vec(), b"\n".to_vec());
    let mut requests = FramedRead::new(reader, framing);
    let mut responses = FramedWrite::new(writer, LinesCodec::new());

    while let Some(frame) = requests.next().await {
        let frame = frame?;
        if let Some(response) = handle_line(&frame, config).await {
            responses.send(serde_json::to_string(&response)?).await?;
        }
    }
    Ok(())
}

async fn handle_line(line: &[u8], config: &Config) -> Option<Value> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(line) {
        Ok(message) => handle_message(&message, config).await,
        Err(err) => {
            warn!(%err, "unparseable request");
            Some(jsonrpc_error(
                &Value::Null,
                PARSE_ERROR,
                &format!("Parse error: {err}"),
            ))
        }
    }
}

/// Dispatch one message. Notifications (no `id`) never get a response.
async fn handle_message(message: &Value, config: &Config) -> Option<Value> {
    let id = message.get("id").cloned();
    let method = message.get("method").and_then(Value::as_str).unwrap_or("");
    let params = message.get("params");

    let outcome = match method {
        "initialize" => Ok(initialize()),
        "notifications/initialized" => {
            debug!("client initialized");
            return None;
        }
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tools::definitions() })),
        "tools/call" => tools::call(params, config).await,
        "resources/list" => resources::list(config),
        "resources/read" => resources::read(params, config, config.resource_lines),
        _ => {
            let id = id?;
            return Some(jsonrpc_error(
                &id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {method}"),
            ));
        }
    };

    let id = id?;
    Some(match outcome {
        Ok(result) => jsonrpc_result(&id, result),
        Err(err) => {
            warn!(method, %err, "request failed");
            err.into_response(&id)
        }
    })
}

fn initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
        },
        "capabilities": {
            "tools": {},
            "resources": {},
        },
    })
}
