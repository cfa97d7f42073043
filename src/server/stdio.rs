//! stdio transport: line-delimited JSON-RPC 2.0.
//!
//! Requests are handled concurrently; responses are written one per line
//! in completion order. stdout carries nothing but protocol messages.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::execution::Executor;
use crate::tools::{descriptors, ToolBox};

/// Protocol version answered when the client does not name one.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl Response {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Serve over the process's stdin and stdout.
pub async fn serve<E>(tools: Arc<ToolBox<E>>) -> crate::Result<()>
where
    E: Executor + 'static,
{
    tracing::info!("Serving wsl-win-bridge over stdio");
    serve_lines(tools, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve over arbitrary streams until `input` reaches EOF and every
/// in-flight request has been answered.
pub async fn serve_lines<E, R, W>(tools: Arc<ToolBox<E>>, input: R, mut output: W) -> crate::Result<()>
where
    E: Executor + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut reader = BufReader::new(input);
    // `read_until` keeps partial bytes here when a select round cancels it.
    let mut buf = Vec::new();
    let mut in_flight = JoinSet::new();
    let mut input_open = true;

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut buf), if input_open => {
                match read {
                    Ok(0) => input_open = false,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "failed to read input");
                        input_open = false;
                    }
                }
                if buf.ends_with(b"\n") || (!input_open && !buf.is_empty()) {
                    let line = std::mem::take(&mut buf);
                    if !line.iter().all(u8::is_ascii_whitespace) {
                        let tools = Arc::clone(&tools);
                        let tx = tx.clone();
                        in_flight.spawn(async move {
                            if let Some(response) = handle_line(&tools, &line).await {
                                let _ = tx.send(response);
                            }
                        });
                    }
                }
            }
            Some(response) = rx.recv() => {
                output.write_all(response.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
            Some(joined) = in_flight.join_next() => {
                if let Err(e) = joined {
                    warn!(error = %e, "request task failed");
                }
            }
            else => break,
        }

        if !input_open && in_flight.is_empty() && rx.is_empty() {
            break;
        }
    }

    Ok(())
}

/// Handle one input line, returning the serialized response if one is due.
///
/// Bytes that are not valid UTF-8 or not JSON get a parse error.
async fn handle_line<E: Executor>(tools: &ToolBox<E>, line: &[u8]) -> Option<String> {
    let value: Value = match serde_json::from_slice(line) {
        Ok(v) => v,
        Err(e) => return encode(Response::err(Value::Null, PARSE_ERROR, e.to_string())),
    };

    // Responses from the client carry no method; nothing to answer.
    if value.get("method").is_none() && value.get("id").is_some() {
        return None;
    }

    let request: Request = match serde_json::from_value(value.clone()) {
        Ok(r) => r,
        Err(e) => {
            let id = value.get("id").cloned().unwrap_or(Value::Null);
            return encode(Response::err(id, INVALID_REQUEST, e.to_string()));
        }
    };

    let Some(id) = request.id else {
        debug!(method = %request.method, "notification");
        return None;
    };

    let response = match dispatch(tools, &request.method, request.params).await {
        Ok(result) => Response::ok(id, result),
        Err((code, message)) => Response::err(id, code, message),
    };
    encode(response)
}

async fn dispatch<E: Executor>(
    tools: &ToolBox<E>,
    method: &str,
    params: Value,
) -> Result<Value, (i64, String)> {
    match method {
        "initialize" => {
            let version = params
                .get("protocolVersion")
                .and_then(Value::as_str)
                .unwrap_or(PROTOCOL_VERSION)
                .to_string();
            Ok(json!({
                "protocolVersion": version,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": {
                    "name": "wsl-win-bridge",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }))
        }
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": descriptors() })),
        "tools/call" => {
            let params: CallParams = serde_json::from_value(params)
                .map_err(|e| (INVALID_PARAMS, e.to_string()))?;
            match tools.call(&params.name, params.arguments).await {
                Ok(output) => serde_json::to_value(output.to_call_result())
                    .map_err(|e| (INTERNAL_ERROR, e.to_string())),
                Err(e @ (BridgeError::UnknownTool(_) | BridgeError::InvalidRequest(_))) => {
                    Err((INVALID_PARAMS, e.to_string()))
                }
                Err(e) => Err((INTERNAL_ERROR, e.to_string())),
            }
        }
        other => Err((METHOD_NOT_FOUND, format!("method not found: {other}"))),
    }
}

fn encode(response: Response) -> Option<String> {
    match serde_json::to_string(&response) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(error = %e, "failed to encode response");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::device::testing::ScriptedExecutor;

    async fn exchange(input: &str) -> Vec<Value> {
        exchange_bytes(input.as_bytes()).await
    }

    async fn exchange_bytes(input: &[u8]) -> Vec<Value> {
        let tools = Arc::new(ToolBox::with_executor(
            ScriptedExecutor::succeeding(),
            Arc::new(BridgeConfig::default()),
        ));
        let mut output = Vec::new();
        serve_lines(tools, input, &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_initialize() {
        let out = exchange(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#,
        )
        .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], 1);
        assert_eq!(out[0]["result"]["serverInfo"]["name"], "wsl-win-bridge");
        assert_eq!(out[0]["result"]["protocolVersion"], "2024-11-05");
        assert!(out[0]["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let out = exchange(
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n\n\
             {\"jsonrpc\":\"2.0\",\"id\":\"p\",\"method\":\"ping\"}\n",
        )
        .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], "p");
        assert_eq!(out[0]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_keeps_serving() {
        let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe garbage\n");
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");

        let out = exchange_bytes(&input).await;
        assert_eq!(out.len(), 3);

        let parse_errors: Vec<&Value> = out.iter().filter(|r| r["id"].is_null()).collect();
        assert_eq!(parse_errors.len(), 1);
        assert_eq!(parse_errors[0]["error"]["code"], PARSE_ERROR);

        let mut ids: Vec<i64> = out.iter().filter_map(|r| r["id"].as_i64()).collect();
        ids.sort();
        assert_eq!(ids, [1, 2]);
    }

    #[tokio::test]
    async fn test_last_line_without_newline_is_answered() {
        let out = exchange("{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n{\"jsonrpc\":\"2.0\",\"id\":8,\"method\":\"ping\"}").await;
        let mut ids: Vec<i64> = out.iter().filter_map(|r| r["id"].as_i64()).collect();
        ids.sort();
        assert_eq!(ids, [7, 8]);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let out = exchange(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        let tools = out[0]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 8);
        assert_eq!(tools[5]["name"], "hdc.shell");
    }

    #[tokio::test]
    async fn test_tools_call() {
        let out = exchange(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"hdc.list_targets","arguments":{}}}"#,
        )
        .await;
        let result = &out[0]["result"];
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["structuredContent"]["args"], json!(["list", "targets"]));
    }

    #[tokio::test]
    async fn test_tools_call_missing_key_is_tool_error() {
        let out = exchange(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"hdc.shell","arguments":{"command":"ls"}}}"#,
        )
        .await;
        assert_eq!(out[0]["result"]["isError"], true);
        assert_eq!(out[0]["result"]["structuredContent"]["exitCode"], -1);
    }

    #[tokio::test]
    async fn test_error_codes() {
        let out = exchange(
            "not json\n\
             {\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"resources/list\"}\n\
             {\"jsonrpc\":\"2.0\",\"id\":6,\"method\":\"tools/call\",\"params\":{\"name\":\"nope\"}}\n\
             {\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"tools/call\",\"params\":{\"name\":\"win.exec\",\"arguments\":{}}}\n",
        )
        .await;
        assert_eq!(out.len(), 4);

        let code_for = |id: Value| {
            out.iter()
                .find(|r| r["id"] == id)
                .map(|r| r["error"]["code"].clone())
                .unwrap()
        };
        assert_eq!(code_for(Value::Null), PARSE_ERROR);
        assert_eq!(code_for(json!(5)), METHOD_NOT_FOUND);
        assert_eq!(code_for(json!(6)), INVALID_PARAMS);
        assert_eq!(code_for(json!(7)), INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_client_responses_are_ignored() {
        let out = exchange(r#"{"jsonrpc":"2.0","id":9,"result":{}}"#).await;
        assert!(out.is_empty());
    }
}
