//! Protocol Dispatch Registry: the tool, resource and prompt catalogs.
//!
//! Catalogs are built once in [`Registry::new`] and never change afterwards,
//! so a `Registry` is shared behind an `Arc` without locking.

pub mod catalog;
pub mod prompts;
pub mod resources;
pub mod tools;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::charts::ChartService;
use crate::config::Settings;
use crate::ephemeris::EphemerisProvider;
use crate::error::{AstroError, CatalogKind, ErrorClass, Result};
use crate::validation::sanitize_input;

pub use catalog::{
    PromptArgument, PromptDescriptor, PromptMessage, PromptResponse, ResourceContents,
    ResourceDescriptor, ToolContent, ToolDescriptor, ToolResult, JSON_MIME_TYPE,
};
pub use tools::ToolExecutor;

/// Name to position index; rejects duplicates.
fn index_by<T>(
    items: &[T],
    kind: CatalogKind,
    key: impl Fn(&T) -> &'static str,
) -> Result<HashMap<&'static str, usize>> {
    let mut index = HashMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        if index.insert(key(item), position).is_some() {
            return Err(AstroError::Configuration(format!(
                "duplicate {} name '{}'",
                kind,
                key(item)
            )));
        }
    }
    Ok(index)
}

pub struct Registry {
    settings: Arc<Settings>,
    tools: Vec<ToolDescriptor>,
    executors: Vec<Arc<dyn ToolExecutor>>,
    tool_index: HashMap<&'static str, usize>,
    resources: Vec<ResourceDescriptor>,
    resource_index: HashMap<&'static str, usize>,
    prompts: Vec<PromptDescriptor>,
    prompt_index: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn new(settings: Arc<Settings>, provider: Arc<dyn EphemerisProvider>) -> Result<Self> {
        let service = Arc::new(ChartService::new(settings.clone(), provider));
        let (tools, executors): (Vec<_>, Vec<_>) =
            tools::builtin_tools(service)?.into_iter().unzip();
        Self::from_parts(
            settings,
            tools,
            executors,
            resources::descriptors(),
            prompts::descriptors(),
        )
    }

    fn from_parts(
        settings: Arc<Settings>,
        tools: Vec<ToolDescriptor>,
        executors: Vec<Arc<dyn ToolExecutor>>,
        resources: Vec<ResourceDescriptor>,
        prompts: Vec<PromptDescriptor>,
    ) -> Result<Self> {
        let tool_index = index_by(&tools, CatalogKind::Tool, |t| t.name)?;
        let resource_index = index_by(&resources, CatalogKind::Resource, |r| r.uri)?;
        let prompt_index = index_by(&prompts, CatalogKind::Prompt, |p| p.name)?;
        info!(
            tools = tools.len(),
            resources = resources.len(),
            prompts = prompts.len(),
            "registry ready"
        );

        Ok(Self {
            settings,
            tools,
            executors,
            tool_index,
            resources,
            resource_index,
            prompts,
            prompt_index,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn list_tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get_tool(&self, name: &str) -> Result<&ToolDescriptor> {
        self.tool_index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| AstroError::not_found(CatalogKind::Tool, name))
    }

    /// Run a tool. Domain failures come back in-band with `is_error` set; only
    /// protocol-class errors are returned as `Err`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        info!(tool = name, "calling tool");
        match self.execute(name, arguments).await {
            Ok(data) => Ok(ToolResult::success(name, data)),
            Err(err) => match err.class() {
                ErrorClass::Protocol => Err(err),
                ErrorClass::Validation | ErrorClass::NotFound | ErrorClass::Computation => {
                    warn!(tool = name, error = %err, "tool failed");
                    Ok(ToolResult::failure(format!("Tool execution failed: {}", err)))
                }
            },
        }
    }

    async fn execute(&self, name: &str, arguments: Value) -> Result<Value> {
        let executor = self
            .tool_index
            .get(name)
            .map(|&i| &self.executors[i])
            .ok_or_else(|| AstroError::not_found(CatalogKind::Tool, name))?;
        let arguments = match arguments {
            Value::Null => Value::Object(Map::new()),
            other => sanitize_input(other)?,
        };
        executor.execute(arguments).await
    }

    pub fn list_resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    pub fn get_resource_content(&self, uri: &str) -> Result<Value> {
        let descriptor = self
            .resource_index
            .get(uri)
            .map(|&i| &self.resources[i])
            .ok_or_else(|| AstroError::not_found(CatalogKind::Resource, uri))?;
        resources::content(descriptor.uri, &self.settings)
            .ok_or_else(|| AstroError::computation(format!("No content for resource '{}'", uri)))
    }

    /// `resources/read` payload: the content serialized as JSON text.
    pub fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContents>> {
        let content = self.get_resource_content(uri)?;
        let text = serde_json::to_string_pretty(&content)
            .map_err(|e| AstroError::computation(e.to_string()))?;
        Ok(vec![ResourceContents {
            uri: uri.to_string(),
            mime_type: JSON_MIME_TYPE,
            text,
        }])
    }

    pub fn list_prompts(&self) -> &[PromptDescriptor] {
        &self.prompts
    }

    pub fn get_prompt_content(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Vec<PromptMessage>> {
        let descriptor = self
            .prompt_index
            .get(name)
            .map(|&i| &self.prompts[i])
            .ok_or_else(|| AstroError::not_found(CatalogKind::Prompt, name))?;
        prompts::render(descriptor, arguments)
    }

    pub fn get_prompt(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<PromptResponse> {
        Ok(PromptResponse {
            description: format!("Formatted prompt for {}", name),
            messages: self.get_prompt_content(name, arguments)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::FixedEphemeris;
    use crate::models::Body;
    use async_trait::async_trait;
    use serde_json::json;

    fn registry() -> Registry {
        let provider = FixedEphemeris::new(0.0).with_body(Body::Sun, 120.5);
        Registry::new(Arc::new(Settings::default()), Arc::new(provider)).unwrap()
    }

    struct Rejecting;

    #[async_trait]
    impl ToolExecutor for Rejecting {
        async fn execute(&self, _arguments: Value) -> Result<Value> {
            Err(AstroError::InvalidParams("bad".to_string()))
        }
    }

    fn descriptor(name: &'static str) -> ToolDescriptor {
        ToolDescriptor {
            name,
            description: "test",
            input_schema: Arc::new(Map::new()),
        }
    }

    #[test]
    fn test_catalogs_are_populated_in_order() {
        let registry = registry();
        assert_eq!(registry.list_tools().len(), 8);
        assert_eq!(registry.list_tools()[0].name, "generate_natal_chart");
        assert_eq!(registry.list_resources().len(), 6);
        assert_eq!(registry.list_prompts().len(), 4);
        assert!(registry.get_tool("calculate_dignities").is_ok());
    }

    #[test]
    fn test_get_tool_not_found() {
        let err = registry().get_tool("nope").unwrap_err();
        assert_eq!(err.to_string(), "Tool 'nope' not found");
        assert_eq!(err.class(), ErrorClass::NotFound);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let executor: Arc<dyn ToolExecutor> = Arc::new(Rejecting);
        let result = Registry::from_parts(
            Arc::new(Settings::default()),
            vec![descriptor("twice"), descriptor("twice")],
            vec![executor.clone(), executor],
            vec![],
            vec![],
        );
        assert!(matches!(result, Err(AstroError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_in_band() {
        let result = registry().call_tool("invalid_tool_name", json!({})).await.unwrap();
        assert!(result.is_error);
        assert!(result.text().unwrap().contains("invalid_tool_name"));
    }

    #[tokio::test]
    async fn test_validation_failure_is_in_band() {
        let result = registry()
            .call_tool(
                "generate_natal_chart",
                json!({"date_time": "yesterday", "latitude": 0, "longitude": 0}),
            )
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.text().unwrap().starts_with("Tool execution failed"));
    }

    #[tokio::test]
    async fn test_protocol_errors_propagate() {
        let registry = Registry::from_parts(
            Arc::new(Settings::default()),
            vec![descriptor("strict")],
            vec![Arc::new(Rejecting)],
            vec![],
            vec![],
        )
        .unwrap();
        let err = registry.call_tool("strict", json!({})).await.unwrap_err();
        assert!(matches!(err, AstroError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_arguments_are_sanitized() {
        let result = registry()
            .call_tool(
                "generate_natal_chart",
                json!({
                    "date_time": "<1990-05-15>",
                    "latitude": 0,
                    "longitude": 0,
                    "objects": ["sun"]
                }),
            )
            .await
            .unwrap();
        assert!(!result.is_error, "{:?}", result.text());
    }

    #[test]
    fn test_read_resource() {
        let registry = registry();
        let contents = registry.read_resource("house_systems").unwrap();
        assert_eq!(contents[0].mime_type, "application/json");
        let parsed: Value = serde_json::from_str(&contents[0].text).unwrap();
        assert_eq!(parsed["systems"].as_array().unwrap().len(), 10);

        let err = registry.read_resource("nonexistent").unwrap_err();
        assert_eq!(err.rpc_code(), crate::error::codes::NOT_FOUND);
    }

    #[test]
    fn test_get_prompt() {
        let registry = registry();
        let args = json!({"synastry_data": "S"}).as_object().cloned().unwrap();
        let response = registry.get_prompt("compatibility_analysis", &args).unwrap();
        assert_eq!(response.description, "Formatted prompt for compatibility_analysis");
        assert_eq!(response.messages.len(), 1);

        let err = registry.get_prompt("missing", &args).unwrap_err();
        assert!(matches!(err, AstroError::NotFound { kind: CatalogKind::Prompt, .. }));
    }
}
