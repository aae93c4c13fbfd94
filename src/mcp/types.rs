//! MCP wire types and JSON-RPC 2.0 primitives
//!
//! Defines the subset of the Model Context Protocol this harness speaks:
//! the `initialize` lifecycle handshake, `tools/list`, and `tools/call`.
//! Struct fields are `camelCase` on the wire; `Option<>` fields omit their
//! key from JSON when `None`.

use serde::{Deserialize, Serialize};

/// The MCP protocol revision sent during the `initialize` handshake and on
/// every HTTP request.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// Lifecycle: client sends `initialize` to open a session.
pub const METHOD_INITIALIZE: &str = "initialize";
/// Lifecycle: client sends `notifications/initialized` after the server ACKs.
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
/// Request the list of available tools.
pub const METHOD_TOOLS_LIST: &str = "tools/list";
/// Invoke a named tool.
pub const METHOD_TOOLS_CALL: &str = "tools/call";

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 wire types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request object. `id` is `None` for notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// Request identifier; absent for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Builds a request with a numeric id.
    pub fn new(id: u64, method: &str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(serde_json::json!(id)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    /// Builds a notification (no id, no response expected).
    pub fn notification(method: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.to_string(),
            params: None,
        }
    }
}

/// A JSON-RPC 2.0 response object. Exactly one of `result` / `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// Identifier of the request this responds to.
    pub id: serde_json::Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// MCP lifecycle types
// ---------------------------------------------------------------------------

/// Parameters for the `initialize` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Requested protocol revision.
    pub protocol_version: String,
    /// Client capability advertisement; empty for this harness.
    pub capabilities: serde_json::Value,
    /// Client identity.
    pub client_info: ClientInfo,
}

/// Client identity sent during `initialize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client application name.
    pub name: String,
    /// Client application version.
    pub version: String,
}

/// Result of the `initialize` request. Only the fields this harness reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol revision the server settled on.
    pub protocol_version: String,
    /// Server identity, when advertised.
    #[serde(default)]
    pub server_info: Option<serde_json::Value>,
    /// Server capability advertisement.
    #[serde(default)]
    pub capabilities: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Tool types
// ---------------------------------------------------------------------------

/// A callable tool advertised by a capability server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name, unique within its server (not globally).
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// JSON schema for the tool's arguments, when advertised.
    #[serde(default, rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<serde_json::Value>,
}

/// Result of `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// The advertised tools.
    pub tools: Vec<Tool>,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Name of the tool to invoke.
    pub name: String,
    /// Tool arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

/// Result of `tools/call`. Content blocks are kept as raw values; this
/// harness renders their `text` fields when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Content blocks produced by the tool.
    #[serde(default)]
    pub content: Vec<serde_json::Value>,
    /// True when the tool reported a failure.
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Concatenates the `text` fields of all content blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_with_id() {
        let req = JsonRpcRequest::new(7, METHOD_TOOLS_LIST, serde_json::json!({}));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["method"], "tools/list");
    }

    #[test]
    fn test_notification_omits_id() {
        let req = JsonRpcRequest::notification(METHOD_INITIALIZED);
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("params").is_none());
    }

    #[test]
    fn test_response_with_error_deserializes() {
        let json = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"not found"}}"#;
        let resp: JsonRpcResponse = serde_json::from_str(json).unwrap();
        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[test]
    fn test_tool_deserializes_with_input_schema() {
        let json = r#"{
            "name": "DescribeInstances",
            "description": "List compute instances",
            "inputSchema": {"type": "object"}
        }"#;
        let tool: Tool = serde_json::from_str(json).unwrap();
        assert_eq!(tool.name, "DescribeInstances");
        assert!(tool.input_schema.is_some());
    }

    #[test]
    fn test_tool_description_optional() {
        let tool: Tool = serde_json::from_str(r#"{"name":"t"}"#).unwrap();
        assert!(tool.description.is_none());
    }

    #[test]
    fn test_initialize_params_camel_case_on_wire() {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: serde_json::json!({}),
            client_info: ClientInfo {
                name: "toolgate".to_string(),
                version: "0.1.0".to_string(),
            },
        };
        let value = serde_json::to_value(&params).unwrap();
        assert!(value.get("protocolVersion").is_some());
        assert!(value.get("clientInfo").is_some());
    }

    #[test]
    fn test_call_tool_result_text_concatenation() {
        let result = CallToolResult {
            content: vec![
                serde_json::json!({"type": "text", "text": "line one"}),
                serde_json::json!({"type": "image", "data": "ignored"}),
                serde_json::json!({"type": "text", "text": "line two"}),
            ],
            is_error: false,
        };
        assert_eq!(result.text(), "line one\nline two");
    }
}
