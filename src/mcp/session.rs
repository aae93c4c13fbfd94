//! Bearer-authenticated streamable-HTTP MCP session
//!
//! [`McpSession`] speaks JSON-RPC 2.0 over HTTP POST to a single capability
//! server. Each request is one POST; the server may answer with
//! `application/json` (a direct JSON body), `text/event-stream` (a single
//! SSE event carrying the JSON-RPC response), or `202 Accepted` with no
//! body (notifications).
//!
//! # Session management
//!
//! A successful `initialize` POST may return an `Mcp-Session-Id` response
//! header. When present it is stored and attached to every subsequent
//! request, and [`McpSession::close`] issues an HTTP DELETE with the same
//! header to terminate the session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::{Result, ToolgateError};
use crate::mcp::types::{
    CallToolParams, CallToolResult, ClientInfo, InitializeParams, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, Tool, METHOD_INITIALIZE, METHOD_INITIALIZED,
    METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, PROTOCOL_VERSION,
};

/// An open session against one capability server.
///
/// Construct with [`McpSession::connect`], which performs the `initialize`
/// handshake. The session owns the live connection state (session id) and
/// must be released exactly once via [`McpSession::close`], which consumes
/// it.
#[derive(Debug)]
pub struct McpSession {
    http: Arc<reqwest::Client>,
    endpoint: Url,
    bearer: String,
    timeout: Duration,
    session_id: Option<String>,
    next_id: AtomicU64,
}

impl McpSession {
    /// Opens a session: POSTs `initialize`, captures the session id header,
    /// and sends the `notifications/initialized` acknowledgement.
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client.
    /// * `endpoint` - The capability server URL.
    /// * `bearer` - Bearer token attached to every request.
    /// * `timeout` - Per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ToolgateError::Mcp`] when the handshake fails at any step.
    pub async fn connect(
        http: Arc<reqwest::Client>,
        endpoint: Url,
        bearer: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut session = Self {
            http,
            endpoint,
            bearer: bearer.to_string(),
            timeout,
            session_id: None,
            next_id: AtomicU64::new(1),
        };

        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: serde_json::json!({}),
            client_info: ClientInfo {
                name: "toolgate".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        let id = session.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, METHOD_INITIALIZE, serde_json::to_value(&params)?);
        let (value, session_id) = session.post_rpc(&request).await?;

        let value = value
            .ok_or_else(|| ToolgateError::Mcp("initialize returned no response body".to_string()))?;
        let init: InitializeResult = serde_json::from_value(value)
            .map_err(|e| ToolgateError::Mcp(format!("malformed initialize result: {e}")))?;
        tracing::debug!(
            endpoint = %session.endpoint,
            protocol = %init.protocol_version,
            "mcp session initialized"
        );
        session.session_id = session_id;

        // The server expects the initialized notification before serving
        // any other request.
        let notification = JsonRpcRequest::notification(METHOD_INITIALIZED);
        session.post_rpc(&notification).await?;

        Ok(session)
    }

    /// Requests the server's tool list.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let result: ListToolsResult = self.request(METHOD_TOOLS_LIST, serde_json::json!({})).await?;
        Ok(result.tools)
    }

    /// Invokes a named tool with the given arguments.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        self.request(METHOD_TOOLS_CALL, serde_json::to_value(&params)?)
            .await
    }

    /// Terminates the session, consuming it.
    ///
    /// When a session id is active an HTTP DELETE is issued to the endpoint
    /// with the `Mcp-Session-Id` header. Servers without session tracking
    /// need no teardown request.
    pub async fn close(self) -> Result<()> {
        let Some(session_id) = self.session_id else {
            return Ok(());
        };

        let resp = self
            .http
            .delete(self.endpoint.as_str())
            .header("Authorization", format!("Bearer {}", self.bearer))
            .header("Mcp-Session-Id", &session_id)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ToolgateError::Mcp(format!("session termination failed: {e}")))?;

        // 405 means the server does not support explicit termination; that
        // is not a failure.
        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::METHOD_NOT_ALLOWED {
            return Err(ToolgateError::Mcp(format!(
                "session termination returned {}",
                resp.status()
            ))
            .into());
        }
        Ok(())
    }

    /// Sends a typed request and deserializes the `result` payload.
    async fn request<R>(&self, method: &str, params: serde_json::Value) -> Result<R>
    where
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, params);
        let (value, _) = self.post_rpc(&request).await?;
        let value = value.ok_or_else(|| {
            ToolgateError::Mcp(format!("'{method}' returned no response body"))
        })?;
        serde_json::from_value(value)
            .map_err(|e| ToolgateError::Mcp(format!("malformed '{method}' result: {e}")).into())
    }

    /// POSTs one JSON-RPC message and returns the `result` value (when the
    /// message was a request) together with any `Mcp-Session-Id` response
    /// header.
    async fn post_rpc(
        &self,
        request: &JsonRpcRequest,
    ) -> Result<(Option<serde_json::Value>, Option<String>)> {
        let mut builder = self
            .http
            .post(self.endpoint.as_str())
            .header("Authorization", format!("Bearer {}", self.bearer))
            .header("Accept", "application/json, text/event-stream")
            .header("MCP-Protocol-Version", PROTOCOL_VERSION)
            .timeout(self.timeout)
            .json(request);

        if let Some(ref session_id) = self.session_id {
            builder = builder.header("Mcp-Session-Id", session_id);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| ToolgateError::Mcp(format!("request failed: {e}")))?;

        // Notifications are acknowledged with 202 and no body.
        if resp.status() == reqwest::StatusCode::ACCEPTED {
            return Ok((None, None));
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ToolgateError::Mcp(format!("server returned {status}: {body}")).into());
        }

        let session_id = resp
            .headers()
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = resp
            .text()
            .await
            .map_err(|e| ToolgateError::Mcp(format!("failed to read response body: {e}")))?;

        // Notifications may also be acknowledged with an empty 200.
        if request.id.is_none() && body.trim().is_empty() {
            return Ok((None, session_id));
        }

        let payload = if content_type.starts_with("text/event-stream") {
            extract_sse_data(&body).ok_or_else(|| {
                ToolgateError::Mcp("event stream contained no data event".to_string())
            })?
        } else {
            body
        };

        let response: JsonRpcResponse = serde_json::from_str(&payload)
            .map_err(|e| ToolgateError::Mcp(format!("malformed JSON-RPC response: {e}")))?;

        if let Some(error) = response.error {
            return Err(ToolgateError::Mcp(format!(
                "server error {}: {}",
                error.code, error.message
            ))
            .into());
        }

        Ok((response.result, session_id))
    }
}

/// Extracts the payload of the first SSE event from a `text/event-stream`
/// body: the concatenated `data:` lines up to the first blank line.
fn extract_sse_data(body: &str) -> Option<String> {
    let mut data_lines = Vec::new();
    for line in body.lines() {
        if let Some(data) = line.strip_prefix("data:") {
            data_lines.push(data.trim_start());
        } else if line.is_empty() && !data_lines.is_empty() {
            break;
        }
    }
    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}
