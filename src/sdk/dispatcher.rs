use crate::protocol::client_events::ClientEvent;
use crate::protocol::server_events::ServerEvent;
use crate::{Result, TRACE_LOG_MAX_BYTES, safe_truncate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::tools::{ToolCall, ToolRegistry, ToolResult};
use super::transport::EventSender;

/// What to do with a call naming a tool nobody registered.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnknownToolPolicy {
    /// Drop the call without replying. The model never receives an output for it.
    #[default]
    Ignore,
    /// Reply with `{"success": false, "error": "unknown tool: <name>"}`.
    ReportError,
}

/// How a single inbound frame was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Not JSON, or a function call whose `arguments` are not JSON.
    Malformed,
    /// A valid event that carries no dispatch action.
    Ignored,
    /// A call to an unbound tool that was dropped.
    UnknownTool(String),
    /// The call was answered with an output and a `response.create`.
    Answered { call_id: String, result: ToolResult },
}

/// Turns inbound function-call events into handler invocations and correlated replies.
///
/// Stateless between frames; clones share the registry and can run concurrently.
#[derive(Clone, Debug)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    policy: UnknownToolPolicy,
}

impl ToolDispatcher {
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry, policy: UnknownToolPolicy::default() }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: UnknownToolPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Decode one data-channel frame.
    ///
    /// # Errors
    /// Returns an error if the frame is not JSON.
    #[allow(clippy::result_large_err)]
    pub fn parse_frame(text: &str) -> Result<ServerEvent> {
        Ok(serde_json::from_str(text)?)
    }

    /// Extract the tool call from a `response.function_call_arguments.done` event.
    ///
    /// Returns `Ok(None)` for every other event kind.
    ///
    /// # Errors
    /// Returns `Error::MalformedMessage` if the call's `arguments` are not JSON.
    #[allow(clippy::result_large_err)]
    pub fn tool_call(event: ServerEvent) -> Result<Option<ToolCall>> {
        match event {
            ServerEvent::ResponseFunctionCallArgumentsDone { name, call_id, arguments, .. } => {
                let arguments = serde_json::from_str(&arguments).map_err(|e| {
                    crate::Error::MalformedMessage(format!("arguments for {name} ({call_id}): {e}"))
                })?;
                Ok(Some(ToolCall { name, call_id, arguments }))
            }
            ServerEvent::Error { error, .. } => {
                tracing::warn!(code = ?error.code, "Realtime error event: {}", error.message);
                Ok(None)
            }
            ServerEvent::ResponseFunctionCallArgumentsDelta { .. }
            | ServerEvent::SessionCreated { .. }
            | ServerEvent::SessionUpdated { .. }
            | ServerEvent::ResponseCreated { .. }
            | ServerEvent::ResponseDone { .. }
            | ServerEvent::Unknown(_) => Ok(None),
        }
    }

    /// Run the bound handler, applying the unknown-tool policy.
    pub async fn dispatch(&self, call: ToolCall) -> Option<ToolResult> {
        let name = call.name.clone();
        match self.registry.invoke(call).await {
            Some(result) => Some(result),
            None => match self.policy {
                UnknownToolPolicy::Ignore => None,
                UnknownToolPolicy::ReportError => Some(ToolResult::failure(format!("unknown tool: {name}"))),
            },
        }
    }

    /// Handle one inbound frame end to end.
    ///
    /// A recognized call is awaited, then answered with `conversation.item.create`
    /// followed by `response.create`, always in that order.
    ///
    /// # Errors
    /// Returns an error only if sending the reply fails.
    pub async fn handle_frame(&self, text: &str, sender: &EventSender) -> Result<DispatchOutcome> {
        let event = match Self::parse_frame(text) {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!("Dropping non-JSON frame ({err}): {}", safe_truncate(text, TRACE_LOG_MAX_BYTES));
                return Ok(DispatchOutcome::Malformed);
            }
        };

        let call = match Self::tool_call(event) {
            Ok(Some(call)) => call,
            Ok(None) => return Ok(DispatchOutcome::Ignored),
            Err(err) => {
                tracing::debug!("Dropping tool call: {err}");
                return Ok(DispatchOutcome::Malformed);
            }
        };

        let call_id = call.call_id.clone();
        let name = call.name.clone();
        tracing::debug!(tool = %name, call_id = %call_id, "Calling local tool");

        let Some(result) = self.dispatch(call).await else {
            tracing::debug!(tool = %name, call_id = %call_id, "No handler registered; call ignored");
            return Ok(DispatchOutcome::UnknownTool(name));
        };

        if let Some(error) = result.error() {
            tracing::info!(tool = %name, call_id = %call_id, "Tool reported failure: {error}");
        }

        let output = result.to_output()?;
        sender.send(&ClientEvent::function_call_output(call_id.clone(), output)).await?;
        sender.send(&ClientEvent::response_create()).await?;

        Ok(DispatchOutcome::Answered { call_id, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::tools::ToolDescriptor;
    use serde_json::json;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDescriptor::new("ping", "Ping", json!({ "type": "object", "properties": {} })),
                |_| async { ToolResult::with_data("pong", json!(true)) },
            )
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn non_call_events_yield_no_tool_call() {
        let event = ToolDispatcher::parse_frame(r#"{"type":"response.done","response":{}}"#).unwrap();
        assert!(ToolDispatcher::tool_call(event).unwrap().is_none());

        let event = ToolDispatcher::parse_frame(r#"{"type":"input_audio_buffer.speech_started"}"#).unwrap();
        assert!(ToolDispatcher::tool_call(event).unwrap().is_none());
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        let frame = json!({
            "type": "response.function_call_arguments.done",
            "name": "ping",
            "call_id": "c1",
            "arguments": "{not json",
        })
        .to_string();
        let event = ToolDispatcher::parse_frame(&frame).unwrap();
        assert!(matches!(ToolDispatcher::tool_call(event), Err(crate::Error::MalformedMessage(_))));
    }

    #[tokio::test]
    async fn unknown_tool_policy_controls_reply() {
        let call = ToolCall { name: "nope".into(), call_id: "c".into(), arguments: json!({}) };

        let ignoring = ToolDispatcher::new(registry());
        assert!(ignoring.dispatch(call.clone()).await.is_none());

        let reporting = ToolDispatcher::new(registry()).with_policy(UnknownToolPolicy::ReportError);
        assert_eq!(
            reporting.dispatch(call).await,
            Some(ToolResult::failure("unknown tool: nope"))
        );
    }

    #[tokio::test]
    async fn known_tool_dispatches() {
        let dispatcher = ToolDispatcher::new(registry());
        let call = ToolCall { name: "ping".into(), call_id: "c".into(), arguments: json!({}) };
        let result = dispatcher.dispatch(call).await.unwrap();
        assert_eq!(result.get("pong"), Some(&json!(true)));
    }
}
