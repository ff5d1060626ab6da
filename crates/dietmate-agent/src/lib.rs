//! # DietMate Agent
//!
//! The agent layer: persona-bound specialist agents, the routing
//! orchestrator, and the fixed dispatch graph.
//!
//! ## Turn flow
//! ```text
//! user input
//!   ↓ Orchestrator.route() — one structured-output model call
//! RouteDecision { route, slots, query_for_agent }
//!   ↓ Dispatcher — exhaustive match, exactly one handler per turn
//! specialist Agent.answer() — up to 3 tool-calling rounds
//!   ↓
//! final reply, appended to session history
//! ```

pub mod dispatch;
pub mod orchestrator;
pub mod personas;

pub use dispatch::Dispatcher;
pub use orchestrator::{Orchestrator, Route, RouteDecision};

use std::sync::Arc;

use dietmate_core::error::Result;
use dietmate_core::traits::{GenerateParams, Provider};
use dietmate_core::types::{Message, Role};
use dietmate_tools::ToolRegistry;
use dietmate_tools::registry::validate_args;

/// Max tool → model → tool rounds per answer.
const MAX_TOOL_ROUNDS: usize = 3;

/// Messages of history kept per model call (excluding the system prompt).
const HISTORY_WINDOW: usize = 40;

/// A stateless diet agent: a persona bound to a tool set and a model.
/// Any personalization arrives via the `history` and `query` arguments.
pub struct Agent {
    name: String,
    system_prompt: String,
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    params: GenerateParams,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        provider: Arc<dyn Provider>,
        tools: ToolRegistry,
        params: GenerateParams,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            provider,
            tools,
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Answer one query: persona + history + query go to the model, with
    /// both tools available for zero-or-more tool-augmented rounds.
    pub async fn answer(&self, query: &str, history: &[Message]) -> Result<String> {
        let mut conversation = Vec::with_capacity(history.len() + 2);
        conversation.push(Message::system(&self.system_prompt));

        // Replay the session tail; other agents' system context stays out
        let tail_start = history.len().saturating_sub(HISTORY_WINDOW);
        for msg in &history[tail_start..] {
            if msg.role != Role::System {
                conversation.push(msg.clone());
            }
        }
        conversation.push(Message::user(query));

        let tool_defs = self.tools.list();

        let mut final_content = String::new();

        for round in 0..=MAX_TOOL_ROUNDS {
            // Last pass goes out without tools to force a text answer
            let current_tools = if round < MAX_TOOL_ROUNDS {
                tool_defs.as_slice()
            } else {
                &[]
            };
            let response = self
                .provider
                .chat(&conversation, current_tools, &self.params)
                .await?;

            // No tool calls → this is the final text response
            if response.tool_calls.is_empty() {
                final_content = response
                    .content
                    .unwrap_or_else(|| "I'm not sure how to respond.".into());
                break;
            }

            tracing::info!(
                agent = %self.name,
                "Tool round {}/{}: {} tool call(s)",
                round + 1,
                MAX_TOOL_ROUNDS,
                response.tool_calls.len()
            );

            let mut tool_results = Vec::new();
            for tc in &response.tool_calls {
                tracing::debug!("  → {} ({})", tc.function.name, tc.function.arguments);

                if let Some(tool) = self.tools.get(&tc.function.name) {
                    // Non-JSON argument strings skip validation; tools wrap
                    // those into a query themselves
                    let rejected = serde_json::from_str::<serde_json::Value>(&tc.function.arguments)
                        .ok()
                        .and_then(|args| validate_args(&tool.definition(), &args).err());
                    if let Some(msg) = rejected {
                        tool_results.push(Message::tool(format!("Tool error: {msg}"), &tc.id));
                        continue;
                    }
                    match tool.execute(&tc.function.arguments).await {
                        Ok(result) => {
                            let output = if result.output.len() > 4000 {
                                let mut end = 4000;
                                while !result.output.is_char_boundary(end) {
                                    end -= 1;
                                }
                                format!(
                                    "{}...\n[truncated, {} total chars]",
                                    &result.output[..end],
                                    result.output.len()
                                )
                            } else {
                                result.output
                            };
                            tool_results.push(Message::tool(output, &tc.id));
                        }
                        Err(e) => {
                            // Tool failures go back to the model as text, so
                            // the agent can fall back to its other capability
                            tool_results.push(Message::tool(format!("Tool error: {e}"), &tc.id));
                        }
                    }
                } else {
                    tool_results.push(Message::tool(
                        format!("Tool not found: {}", tc.function.name),
                        &tc.id,
                    ));
                }
            }

            conversation.push(Message {
                role: Role::Assistant,
                content: response.content.clone().unwrap_or_default(),
                tool_call_id: None,
                tool_calls: Some(response.tool_calls.clone()),
            });
            conversation.extend(tool_results);
        }

        if final_content.is_empty() {
            final_content = "I looked into that but couldn't put together an answer.".into();
        }

        Ok(final_content)
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use dietmate_core::error::Result;
    use dietmate_core::traits::{GenerateParams, Provider};
    use dietmate_core::types::{
        FunctionCall, Message, ProviderResponse, ToolCall, ToolDefinition,
    };

    /// A provider that replays canned responses and records every request.
    pub struct ScriptedProvider {
        responses: Mutex<Vec<ProviderResponse>>,
        pub requests: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedProvider {
        pub fn new(responses: Vec<ProviderResponse>) -> Self {
            let mut responses = responses;
            responses.reverse(); // pop() returns them in script order
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn text(content: &str) -> ProviderResponse {
            ProviderResponse {
                content: Some(content.to_string()),
                tool_calls: vec![],
                finish_reason: Some("stop".into()),
                usage: None,
            }
        }

        pub fn tool_call(name: &str, arguments: &str) -> ProviderResponse {
            ProviderResponse {
                content: None,
                tool_calls: vec![ToolCall {
                    id: "call_1".into(),
                    r#type: "function".into(),
                    function: FunctionCall {
                        name: name.into(),
                        arguments: arguments.into(),
                    },
                }],
                finish_reason: Some("tool_calls".into()),
                usage: None,
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(
            &self,
            messages: &[Message],
            _tools: &[ToolDefinition],
            _params: &GenerateParams,
        ) -> Result<ProviderResponse> {
            self.requests.lock().unwrap().push(messages.to_vec());
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Self::text("")))
        }
    }
}
