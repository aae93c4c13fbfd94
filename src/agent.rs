//! Tool-calling answer loop
//!
//! Bridges the chat completion client and the open capability handles:
//! the model sees the activated tools as OpenAI function definitions, and
//! every tool call it emits is dispatched to the handle that owns the
//! named tool. The loop is bounded so a misbehaving model cannot spin
//! forever.

use crate::error::{Result, ToolgateError};
use crate::llm::{ChatMessage, ChatToolCall, LlmClient};
use crate::orchestrator::{CapabilityHandle, ToolOrchestrator};

/// Upper bound on model/tool round trips for a single question.
const MAX_TOOL_ROUNDS: usize = 10;

/// System prompt shared by the one-shot and interactive answer paths.
pub const ANSWER_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the provided tools when they \
help answer the user's question, then reply with a concise final answer.";

/// Answers one question using the orchestrator's open handles.
///
/// The conversation starts fresh per call; use [`answer_with_history`] to
/// carry a running transcript across turns.
///
/// # Errors
///
/// Returns an error when the completion endpoint fails or the round limit
/// is exhausted without a final answer.
pub async fn answer(
    llm: &LlmClient,
    orchestrator: &ToolOrchestrator,
    question: &str,
) -> Result<String> {
    let mut history = vec![ChatMessage::system(ANSWER_SYSTEM_PROMPT)];
    answer_with_history(llm, orchestrator, &mut history, question).await
}

/// Answers one question, appending all traffic to `history`.
///
/// Tool calls that name a tool outside the activated scope are answered
/// with an error message so the model can recover instead of the whole
/// turn failing.
pub async fn answer_with_history(
    llm: &LlmClient,
    orchestrator: &ToolOrchestrator,
    history: &mut Vec<ChatMessage>,
    question: &str,
) -> Result<String> {
    history.push(ChatMessage::user(question));

    for round in 0..MAX_TOOL_ROUNDS {
        let schemas = {
            let handles = orchestrator.handles().await;
            function_schemas(&handles)
        };

        let reply = llm.complete(history, schemas).await?;
        let tool_calls = reply.tool_calls.clone();
        history.push(reply.clone());

        let Some(calls) = tool_calls else {
            return Ok(reply.content.unwrap_or_default());
        };
        if calls.is_empty() {
            return Ok(reply.content.unwrap_or_default());
        }

        tracing::debug!(round, calls = calls.len(), "dispatching tool calls");
        for call in calls {
            let output = dispatch(orchestrator, &call).await;
            history.push(ChatMessage::tool_result(call.id, output));
        }
    }

    Err(ToolgateError::Llm(format!(
        "no final answer after {} tool rounds",
        MAX_TOOL_ROUNDS
    ))
    .into())
}

/// Runs one tool call against the owning handle, folding failures into a
/// textual result the model can read.
async fn dispatch(orchestrator: &ToolOrchestrator, call: &ChatToolCall) -> String {
    let arguments = if call.function.arguments.trim().is_empty() {
        None
    } else {
        match serde_json::from_str(&call.function.arguments) {
            Ok(value) => Some(value),
            Err(e) => return format!("Error: invalid tool arguments: {}", e),
        }
    };

    let handles = orchestrator.handles().await;
    let Some(handle) = handles
        .iter()
        .find(|h| h.tools.iter().any(|t| t == &call.function.name))
    else {
        return format!("Error: no active server offers tool '{}'", call.function.name);
    };

    tracing::info!(
        server = %handle.server_key,
        tool = %call.function.name,
        "invoking tool"
    );
    match handle.call_tool(&call.function.name, arguments).await {
        Ok(result) if result.is_error => format!("Tool error: {}", result.text()),
        Ok(result) => result.text(),
        Err(e) => format!("Error: tool invocation failed: {}", e),
    }
}

/// Renders the activated tools of every handle as OpenAI function
/// definitions.
fn function_schemas(handles: &[CapabilityHandle]) -> Vec<serde_json::Value> {
    handles
        .iter()
        .flat_map(|handle| handle.tool_defs.iter())
        .map(function_schema)
        .collect()
}

fn function_schema(tool: &crate::mcp::Tool) -> serde_json::Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description.clone().unwrap_or_default(),
            "parameters": tool
                .input_schema
                .clone()
                .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}})),
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::Tool;

    #[test]
    fn test_function_schema_defaults_missing_fields() {
        let tool = Tool {
            name: "echo".to_string(),
            description: None,
            input_schema: None,
        };
        let schema = function_schema(&tool);
        assert_eq!(schema["function"]["name"], "echo");
        assert_eq!(schema["function"]["description"], "");
        assert_eq!(schema["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_function_schema_preserves_input_schema() {
        let tool = Tool {
            name: "get_weather".to_string(),
            description: Some("Current weather for a city".to_string()),
            input_schema: Some(serde_json::json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"],
            })),
        };
        let schema = function_schema(&tool);
        assert_eq!(schema["type"], "function");
        assert_eq!(
            schema["function"]["parameters"]["required"],
            serde_json::json!(["city"])
        );
    }
}
