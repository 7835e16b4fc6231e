//! MCP session handler: adapts the registry to rmcp's `ServerHandler`.

use std::sync::Arc;

use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, ErrorCode, GetPromptRequestParam,
        GetPromptResult, Implementation, ListPromptsResult, ListResourcesResult, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ReadResourceRequestParam, ReadResourceResult,
        ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    ErrorData, RoleServer, ServerHandler,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::AstroError;
use crate::registry::{Registry, ToolResult};

/// rmcp types are built from their wire JSON so they track the protocol shape
fn from_wire<T: DeserializeOwned>(value: Value) -> Result<T, ErrorData> {
    serde_json::from_value(value).map_err(|e| ErrorData::internal_error(e.to_string(), None))
}

fn to_error_data(err: AstroError) -> ErrorData {
    let message = err.to_string();
    match err {
        AstroError::NotFound { .. } => ErrorData::resource_not_found(message, None),
        AstroError::MethodNotFound(_) => {
            ErrorData::new(ErrorCode::METHOD_NOT_FOUND, message, None)
        }
        AstroError::InvalidRequest(_) => {
            ErrorData::new(ErrorCode::INVALID_REQUEST, message, None)
        }
        AstroError::Validation(_)
        | AstroError::InvalidCoordinate(_)
        | AstroError::InvalidParams(_)
        | AstroError::UnsupportedProtocolVersion(_) => ErrorData::invalid_params(message, None),
        AstroError::Computation(_)
        | AstroError::ChartAssembly(_)
        | AstroError::Ephemeris(_)
        | AstroError::Configuration(_) => ErrorData::internal_error(message, None),
    }
}

fn to_call_result(result: ToolResult) -> Result<CallToolResult, ErrorData> {
    let text = result.text().unwrap_or_default().to_string();
    if result.is_error {
        return Ok(CallToolResult::error(vec![Content::text(text)]));
    }
    let mut content = vec![Content::text(text)];
    if let Some(data) = result.data() {
        let body = serde_json::to_string_pretty(data)
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        content.push(Content::text(body));
    }
    Ok(CallToolResult::success(content))
}

/// MCP server for astrological chart calculations
#[derive(Clone)]
pub struct NatalisServer {
    registry: Arc<Registry>,
}

impl NatalisServer {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    fn tools(&self) -> Vec<Tool> {
        self.registry
            .list_tools()
            .iter()
            .map(|t| Tool::new(t.name, t.description, t.input_schema.clone()))
            .collect()
    }
}

impl ServerHandler for NatalisServer {
    fn get_info(&self) -> ServerInfo {
        let settings = self.registry.settings();
        let mut server_info = Implementation::from_build_env();
        server_info.name = settings.server_name.clone();
        server_info.version = settings.server_version.clone();

        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_prompts()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info,
            instructions: Some(settings.instructions()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let args = Value::Object(request.arguments.unwrap_or_default());
        let result = self
            .registry
            .call_tool(request.name.as_ref(), args)
            .await
            .map_err(to_error_data)?;
        to_call_result(result)
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        from_wire(json!({ "resources": self.registry.list_resources() }))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let contents = self
            .registry
            .read_resource(&request.uri)
            .map_err(to_error_data)?;
        from_wire(json!({ "contents": contents }))
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, ErrorData> {
        from_wire(json!({ "prompts": self.registry.list_prompts() }))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, ErrorData> {
        let arguments = request.arguments.unwrap_or_default();
        let response = self
            .registry
            .get_prompt(&request.name, &arguments)
            .map_err(to_error_data)?;
        from_wire(json!(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::ephemeris::FixedEphemeris;

    fn server() -> NatalisServer {
        let provider = FixedEphemeris::new(0.0);
        let registry = Registry::new(Arc::new(Settings::default()), Arc::new(provider)).unwrap();
        NatalisServer::new(Arc::new(registry))
    }

    #[test]
    fn test_server_info() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, "natalis");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
        assert!(info.capabilities.prompts.is_some());
        assert!(info.instructions.unwrap().contains("generate_natal_chart"));
    }

    #[test]
    fn test_tools_are_exposed() {
        let tools = server().tools();
        assert_eq!(tools.len(), 8);
        assert_eq!(tools[4].name, "calculate_synastry");
    }

    #[test]
    fn test_catalogs_convert_to_rmcp_types() {
        let server = server();
        let resources: ListResourcesResult =
            from_wire(json!({ "resources": server.registry.list_resources() })).unwrap();
        assert_eq!(resources.resources.len(), 6);

        let prompts: ListPromptsResult =
            from_wire(json!({ "prompts": server.registry.list_prompts() })).unwrap();
        assert_eq!(prompts.prompts.len(), 4);

        let contents = server.registry.read_resource("sign_meanings").unwrap();
        let read: ReadResourceResult = from_wire(json!({ "contents": contents })).unwrap();
        assert_eq!(read.contents.len(), 1);
    }

    #[test]
    fn test_error_mapping() {
        let not_found = to_error_data(AstroError::not_found(
            crate::error::CatalogKind::Resource,
            "x",
        ));
        assert_eq!(not_found.code, ErrorCode::RESOURCE_NOT_FOUND);
        let invalid = to_error_data(AstroError::validation("bad"));
        assert_eq!(invalid.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn test_failed_tool_result_is_flagged() {
        let result = to_call_result(ToolResult::failure("Tool execution failed: x")).unwrap();
        assert_eq!(result.is_error, Some(true));
    }
}
