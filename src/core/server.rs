//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] owns the tool registry and answers JSON-RPC requests.
//! It knows nothing about sessions or HTTP; the transport hands it one
//! request at a time and routes the response back to the right session.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content};
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use super::config::Config;
use super::error::Result;
use super::transport::{JsonRpcRequest, JsonRpcResponse};
use crate::domains::actions::{ACTION_MODULES, ActionContext};
use crate::domains::mail::Mailer;
use crate::domains::tools::{Dependencies, ToolError, ToolRegistry, discover};

/// MCP protocol revision spoken by the SSE transport.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tools exposed to clients.
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a server around an already built registry.
    pub fn new(config: Config, registry: ToolRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }

    /// Discover the built-in action modules and create a server for them.
    ///
    /// Credentials from `config` are injected into the actions that
    /// declare them; `mailer` carries outgoing email.
    pub fn from_config(config: Config, mailer: Arc<dyn Mailer>) -> Result<Self> {
        let dependencies = Dependencies::from_credentials(&config.credentials);
        let context = ActionContext::new(mailer);
        let registry = discover(ACTION_MODULES, &context, &dependencies)?;
        info!(tools = ?registry.tool_names(), "Tool registry ready");
        Ok(Self::new(config, registry))
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// List all available tools in registration order.
    pub fn list_tools(&self) -> Vec<Value> {
        self.registry
            .list()
            .iter()
            .map(|tool| {
                let tool = tool.to_tool();
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name.
    ///
    /// Unknown tools and rejected arguments are returned as errors; a
    /// failing action is reported inside the result with `isError` set.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> std::result::Result<CallToolResult, ToolError> {
        let tool = self.registry.resolve(name)?;

        match tool.invoke(arguments).await {
            Ok(value) => Ok(into_call_result(value)),
            Err(ToolError::ExecutionFailed(message)) => {
                Ok(CallToolResult::error(vec![Content::text(message)]))
            }
            Err(e) => Err(e),
        }
    }

    /// Answer one JSON-RPC message.
    ///
    /// Returns `None` for notifications, which never get a response.
    #[instrument(skip_all, fields(method = %request.method))]
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            warn!("Rejected message with jsonrpc version {}", request.jsonrpc);
            return Some(JsonRpcResponse::invalid_request(request.id));
        }

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            _ => {
                warn!("Unknown method: {}", request.method);
                JsonRpcResponse::method_not_found(request.id)
            }
        };
        Some(response)
    }

    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        info!("Processing initialize request");

        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": self.name(),
                "version": self.version()
            },
            "instructions": "Call tools/list to see the available tools. send_email relays mail through Postmark; status reports server health."
        });

        JsonRpcResponse::success(request.id, result)
    }

    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Processing tools/list request");
        JsonRpcResponse::success(request.id, json!({ "tools": self.list_tools() }))
    }

    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params = match request.params {
            Some(p) => p,
            None => return JsonRpcResponse::invalid_params(request.id, "Missing params"),
        };

        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n.to_string(),
            None => return JsonRpcResponse::invalid_params(request.id, "Missing tool name"),
        };

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return JsonRpcResponse::invalid_params(request.id, "Arguments must be an object");
            }
        };

        info!("Calling tool {}", name);
        match self.call_tool(&name, arguments).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => JsonRpcResponse::success(request.id, value),
                Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
            },
            Err(e) => JsonRpcResponse::invalid_params(request.id, e.to_string()),
        }
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => info!("Client sent initialized notification"),
            method => debug!("Received notification: {}", method),
        }
    }
}

/// Wrap an action's return value as tool output.
///
/// Strings become plain text; objects are also attached as structured
/// content so clients can read fields without parsing text.
fn into_call_result(value: Value) -> CallToolResult {
    match value {
        Value::String(text) => CallToolResult::success(vec![Content::text(text)]),
        Value::Object(_) => CallToolResult {
            content: vec![Content::text(value.to_string())],
            structured_content: Some(value),
            is_error: Some(false),
            meta: None,
        },
        other => CallToolResult::success(vec![Content::text(other.to_string())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::mail::{MailError, OutgoingEmail};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail, _credential: &str) -> std::result::Result<(), MailError> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _email: &OutgoingEmail, credential: &str) -> std::result::Result<(), MailError> {
            Err(MailError::relay(format!("authentication rejected for {}", credential)))
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.auth.api_key = "test_auth_key".to_string();
        config.credentials.postmark_api_key = "pm-secret".to_string();
        config.credentials.sender_email = "sender@example.com".to_string();
        config
    }

    fn server() -> McpServer {
        McpServer::from_config(config(), Arc::new(RecordingMailer::default())).unwrap()
    }

    fn call(name: &str, arguments: Value) -> JsonRpcRequest {
        JsonRpcRequest::new(
            1,
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        )
    }

    #[test]
    fn test_list_tools_hides_injected_parameters() {
        let tools = server().list_tools();
        let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
        assert_eq!(names, vec!["send_email", "status"]);

        let schema = &tools[0]["inputSchema"];
        assert!(schema["properties"].get("recipients").is_some());
        assert!(schema["properties"].get("postmark_api_key").is_none());
        assert!(schema["properties"].get("sender_email").is_none());
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = server()
            .handle_request(JsonRpcRequest::new(0, "initialize", Some(json!({}))))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "mcp-sse-server");
        assert!(result["capabilities"].get("tools").is_some());
    }

    #[tokio::test]
    async fn test_status_returns_structured_content() {
        let response = server().handle_request(call("status", json!({}))).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["structuredContent"]["status"], "ok");
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let response = server().handle_request(call("nope", json!({}))).await.unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("Unknown tool: nope"));
    }

    #[tokio::test]
    async fn test_missing_argument_is_invalid_params() {
        let response = server()
            .handle_request(call("send_email", json!({ "recipients": ["a@b.com"] })))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_action_failure_is_redacted_tool_error() {
        let server = McpServer::from_config(config(), Arc::new(FailingMailer)).unwrap();
        let response = server
            .handle_request(call(
                "send_email",
                json!({ "recipients": ["a@b.com"], "subject": "s", "body": "b" }),
            ))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Failed to send email"));
        assert!(!text.contains("pm-secret"));
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let notification: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .unwrap();
        assert!(server().handle_request(notification).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method_and_bad_version() {
        let server = server();
        let response = server
            .handle_request(JsonRpcRequest::new(2, "resources/list", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);

        let mut request = JsonRpcRequest::new(3, "ping", None);
        request.jsonrpc = "1.0".to_string();
        let response = server.handle_request(request).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[tokio::test]
    async fn test_non_object_arguments_rejected() {
        let response = server().handle_request(call("status", json!([1, 2]))).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }
}
