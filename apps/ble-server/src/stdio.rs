//! Newline-delimited JSON-RPC 2.0 transport exposing the tool surface.
//!
//! Each request is handled on its own task, so a long running tool call does
//! not hold up the others. Responses are written as they complete and are
//! matched to requests by id. Notifications (requests without an id) are
//! accepted and never answered.

use ble_core::service::tool::ToolService;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::dto::error::ErrorResponseRestDTO;

const JSONRPC_VERSION: &str = "2.0";
const DEFAULT_PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "SimpleBLE MCP Server";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("I/O error: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: `{0}`")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Clone)]
pub struct StdioServer {
    tool_service: ToolService,
    hide_error_response_cause: bool,
}

impl StdioServer {
    pub fn new(tool_service: ToolService, hide_error_response_cause: bool) -> Self {
        Self {
            tool_service,
            hide_error_response_cause,
        }
    }

    /// Serves requests from `reader` until it reaches end of input and every
    /// pending request has been answered.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<(), StdioError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        let (sender, mut receiver) = mpsc::unbounded_channel::<JsonRpcResponse>();
        // dropped at end of input, so the receiver closes once all tasks finish
        let mut sender = Some(sender);

        loop {
            tokio::select! {
                line = lines.next_line(), if sender.is_some() => match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        if let Some(sender) = &sender {
                            self.dispatch(line, sender.clone());
                        }
                    }
                    None => {
                        tracing::debug!("stdio input closed");
                        sender = None;
                    }
                },
                Some(response) = receiver.recv() => {
                    let mut payload = serde_json::to_vec(&response)?;
                    payload.push(b'\n');
                    writer.write_all(&payload).await?;
                    writer.flush().await?;
                }
                else => break,
            }
        }

        Ok(())
    }

    fn dispatch(&self, line: String, responses: mpsc::UnboundedSender<JsonRpcResponse>) {
        let server = self.clone();

        tokio::spawn(async move {
            if let Some(response) = server.handle_line(&line).await {
                if responses.send(response).is_err() {
                    tracing::warn!("stdio output closed before the response was written");
                }
            }
        });
    }

    async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!("Malformed JSON-RPC message: {err}");
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {err}"),
                ));
            }
        };

        let Some(id) = request.id else {
            tracing::debug!("Received notification `{}`", request.method);
            return None;
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version `{}`", request.jsonrpc),
            ));
        }

        Some(self.handle_request(id, &request.method, request.params).await)
    }

    async fn handle_request(&self, id: Value, method: &str, params: Value) -> JsonRpcResponse {
        match method {
            "initialize" => {
                let protocol_version = params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_PROTOCOL_VERSION);

                JsonRpcResponse::result(
                    id,
                    json!({
                        "protocolVersion": protocol_version,
                        "capabilities": { "tools": { "listChanged": false } },
                        "serverInfo": {
                            "name": SERVER_NAME,
                            "version": env!("CARGO_PKG_VERSION")
                        }
                    }),
                )
            }
            "ping" => JsonRpcResponse::result(id, json!({})),
            "tools/list" => match serde_json::to_value(self.tool_service.list_tools()) {
                Ok(tools) => JsonRpcResponse::result(id, json!({ "tools": tools })),
                Err(err) => JsonRpcResponse::error(id, INTERNAL_ERROR, err.to_string()),
            },
            "tools/call" => {
                let params: CallToolParams = match serde_json::from_value(params) {
                    Ok(params) => params,
                    Err(err) => {
                        return JsonRpcResponse::error(
                            id,
                            INVALID_PARAMS,
                            format!("Invalid params: {err}"),
                        );
                    }
                };

                JsonRpcResponse::result(id, self.call_tool(params).await)
            }
            other => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        }
    }

    /// Tool failures are reported inside the result with `isError` set.
    async fn call_tool(&self, params: CallToolParams) -> Value {
        let (payload, is_error) = match self
            .tool_service
            .call_tool(&params.name, params.arguments)
            .await
        {
            Ok(result) => (result, false),
            Err(error) => {
                tracing::error!(%error, "Error while calling tool `{}`", params.name);
                let response = ErrorResponseRestDTO::from(&error)
                    .hide_cause(self.hide_error_response_cause);
                (json!(response), true)
            }
        };

        let structured = match payload {
            Value::Object(_) => payload,
            other => json!({ "result": other }),
        };

        json!({
            "content": [{ "type": "text", "text": structured.to_string() }],
            "structuredContent": structured,
            "isError": is_error
        })
    }
}
