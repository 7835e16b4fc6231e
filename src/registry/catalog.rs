//! Catalog entries and the payloads they produce, in MCP wire shape.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

pub const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Arc<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDescriptor {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptArgument {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    /// Placeholder rendered when an optional argument is omitted
    #[serde(skip)]
    pub default: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Outcome of `tools/call`. Failures are reported here, not as protocol errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(name: &str, data: Value) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text",
                text: format!("Tool '{}' executed successfully", name),
                data: Some(data),
            }],
            is_error: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text",
                text: message.into(),
                data: None,
            }],
            is_error: true,
        }
    }

    /// First text block, if any
    pub fn text(&self) -> Option<&str> {
        self.content.first().map(|c| c.text.as_str())
    }

    pub fn data(&self) -> Option<&Value> {
        self.content.first().and_then(|c| c.data.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceContents {
    pub uri: String,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMessage {
    pub role: &'static str,
    pub content: PromptContent,
}

impl PromptMessage {
    pub fn user(text: String) -> Self {
        Self {
            role: "user",
            content: PromptContent { kind: "text", text },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptResponse {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}
