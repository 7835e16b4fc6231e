//! JSON-RPC envelope transport: `{jsonrpc, id, method, params}` in,
//! `{jsonrpc, id, result | error}` out, one message per line.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{codes, AstroError, Result};
use crate::registry::Registry;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
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

    fn from_error(id: Value, err: &AstroError) -> Self {
        Self::failure(id, err.rpc_code(), err.to_string())
    }
}

/// Methods the dispatcher routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Ping,
    ToolsList,
    ToolsCall,
    ResourcesList,
    ResourcesRead,
    PromptsList,
    PromptsGet,
}

impl Method {
    pub fn parse(name: &str) -> Option<Self> {
        let method = match name {
            "initialize" => Method::Initialize,
            "ping" => Method::Ping,
            "tools/list" => Method::ToolsList,
            "tools/call" => Method::ToolsCall,
            "resources/list" => Method::ResourcesList,
            "resources/read" => Method::ResourcesRead,
            "prompts/list" => Method::PromptsList,
            "prompts/get" => Method::PromptsGet,
            _ => return None,
        };
        Some(method)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    protocol_version: String,
    #[serde(default)]
    client_info: Value,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

fn params<T: serde::de::DeserializeOwned>(raw: Value) -> Result<T> {
    let raw = if raw.is_null() { json!({}) } else { raw };
    serde_json::from_value(raw).map_err(|e| AstroError::InvalidParams(e.to_string()))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| AstroError::computation(e.to_string()))
}

/// Routes envelopes to the registry.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Handle one decoded message. Notifications (no `id`) yield `None`.
    pub async fn handle(&self, message: Value) -> Option<JsonRpcResponse> {
        let Value::Object(envelope) = message else {
            let err = AstroError::InvalidRequest("expected an object".to_string());
            return Some(JsonRpcResponse::from_error(Value::Null, &err));
        };

        let id = envelope.get("id").cloned();
        let Some(method) = envelope.get("method").and_then(Value::as_str) else {
            let err = AstroError::InvalidRequest("missing method".to_string());
            return Some(JsonRpcResponse::from_error(id.unwrap_or(Value::Null), &err));
        };
        let raw_params = envelope.get("params").cloned().unwrap_or(Value::Null);

        let outcome = self.route(method, raw_params).await;
        let id = match id {
            Some(id) => id,
            None => {
                debug!(method, "notification handled");
                return None;
            }
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                warn!(method, code = err.rpc_code(), error = %err, "request failed");
                JsonRpcResponse::from_error(id, &err)
            }
        })
    }

    /// Handle one line of input; malformed JSON yields a parse error.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle(message).await,
            Err(e) => Some(JsonRpcResponse::failure(
                Value::Null,
                codes::PARSE_ERROR,
                format!("Parse error: {}", e),
            )),
        }
    }

    async fn route(&self, name: &str, raw_params: Value) -> Result<Value> {
        let method =
            Method::parse(name).ok_or_else(|| AstroError::MethodNotFound(name.to_string()))?;
        info!(method = name, "request");

        match method {
            Method::Initialize => self.initialize(params(raw_params)?),
            Method::Ping => Ok(json!({})),
            Method::ToolsList => Ok(json!({ "tools": self.registry.list_tools() })),
            Method::ToolsCall => {
                let call: CallToolParams = params(raw_params)?;
                let result = self.registry.call_tool(&call.name, call.arguments).await?;
                to_value(&result)
            }
            Method::ResourcesList => Ok(json!({ "resources": self.registry.list_resources() })),
            Method::ResourcesRead => {
                let read: ReadResourceParams = params(raw_params)?;
                Ok(json!({ "contents": self.registry.read_resource(&read.uri)? }))
            }
            Method::PromptsList => Ok(json!({ "prompts": self.registry.list_prompts() })),
            Method::PromptsGet => {
                let get: GetPromptParams = params(raw_params)?;
                to_value(&self.registry.get_prompt(&get.name, &get.arguments)?)
            }
        }
    }

    fn initialize(&self, request: InitializeParams) -> Result<Value> {
        let settings = self.registry.settings();
        if request.protocol_version != settings.protocol_version {
            return Err(AstroError::UnsupportedProtocolVersion(format!(
                "{} (supported: {})",
                request.protocol_version, settings.protocol_version
            )));
        }
        info!(client = %request.client_info, "client initialized");

        Ok(json!({
            "protocolVersion": settings.protocol_version,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false },
                "prompts": { "listChanged": false },
            },
            "serverInfo": {
                "name": settings.server_name,
                "version": settings.server_version,
            },
            "instructions": settings.instructions(),
        }))
    }
}

/// Read newline-delimited envelopes from `reader` until EOF, writing one
/// response line per request.
pub async fn serve_lines<R, W>(
    dispatcher: &Dispatcher,
    reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = dispatcher.handle_line(&line).await {
            let mut encoded = serde_json::to_string(&response)?;
            encoded.push('\n');
            writer.write_all(encoded.as_bytes()).await?;
            writer.flush().await?;
        }
    }
    info!("input closed");
    Ok(())
}
