//! OpenAI-compatible chat completion client
//!
//! Speaks the `/chat/completions` wire format against any compatible
//! endpoint. The client doubles as the orchestrator's reasoning
//! collaborator: [`LlmClient`] implements [`ToolSelector`] by asking the
//! model to narrow the discovered tool list to a per-server selection map.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolgateError};
use crate::orchestrator::{BriefTool, ToolSelector};

/// System prompt used when narrowing tools for a request.
const SELECTION_SYSTEM_PROMPT: &str = "You route user requests to tools hosted on multiple servers. \
Given the available tools and a user request, reply with ONLY a JSON object mapping each `server` \
value to the list of tool names needed to answer the request. Use only servers and tools from the \
provided list. Do not wrap the JSON in markdown fences and do not add commentary.";

/// A chat message in OpenAI wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// A tool-result message answering the call with the given id.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// Tool call emitted by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ChatFunctionCall,
}

/// Function name and JSON-encoded arguments inside a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible chat completion endpoint.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use toolgate::llm::{ChatMessage, LlmClient};
///
/// # async fn example() -> toolgate::error::Result<()> {
/// let client = LlmClient::new(
///     Arc::new(reqwest::Client::new()),
///     "https://api.openai.com/v1",
///     "sk-...",
///     "gpt-4o-mini",
/// );
/// let reply = client
///     .complete(&[ChatMessage::user("Hello!")], Vec::new())
///     .await?;
/// println!("{}", reply.content.unwrap_or_default());
/// # Ok(())
/// # }
/// ```
pub struct LlmClient {
    http: Arc<reqwest::Client>,
    api_base: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    /// Creates a client for the given API base URL, key, and model.
    pub fn new(
        http: Arc<reqwest::Client>,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            http,
            api_base,
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one chat completion request and returns the first choice.
    ///
    /// # Errors
    ///
    /// Returns [`ToolgateError::Llm`] when the request fails, the endpoint
    /// answers with a non-success status, or the response carries no
    /// choices.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Vec<serde_json::Value>,
    ) -> Result<ChatMessage> {
        let url = format!("{}/chat/completions", self.api_base);
        let request = ChatRequest {
            model: &self.model,
            messages,
            tools,
        };

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            "sending chat completion request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ToolgateError::Llm(format!("chat completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolgateError::Llm(format!(
                "chat completion returned {}: {}",
                status, body
            ))
            .into());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ToolgateError::Llm(format!("failed to parse chat completion: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ToolgateError::Llm("chat completion returned no choices".to_string()).into())
    }
}

#[async_trait]
impl ToolSelector for LlmClient {
    async fn select_tools(&self, tools: &[BriefTool], request: &str) -> Result<String> {
        let catalog = serde_json::to_string_pretty(tools)?;
        let messages = [
            ChatMessage::system(SELECTION_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Available tools:\n{}\n\nUser request: {}",
                catalog, request
            )),
        ];

        let reply = self.complete(&messages, Vec::new()).await?;
        reply
            .content
            .ok_or_else(|| ToolgateError::Llm("selection reply carried no content".to_string()).into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        let msg = ChatMessage::user("hi");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content.as_deref(), Some("hi"));
        assert!(msg.tool_calls.is_none());

        let result = ChatMessage::tool_result("call_1", "42");
        assert_eq!(result.role, "tool");
        assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_chat_request_omits_empty_tools() {
        let messages = [ChatMessage::user("hi")];
        let request = ChatRequest {
            model: "test-model",
            messages: &messages,
            tools: Vec::new(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_chat_response_parses_tool_call() {
        let body = serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"city\":\"Oslo\"}"}
                    }]
                }
            }]
        });
        let parsed: ChatResponse = serde_json::from_value(body).unwrap();
        let message = &parsed.choices[0].message;
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "get_weather");
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let client = LlmClient::new(
            Arc::new(reqwest::Client::new()),
            "http://localhost:8000/v1/",
            "key",
            "m",
        );
        assert_eq!(client.api_base, "http://localhost:8000/v1");
    }
}
