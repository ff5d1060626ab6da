//! The two seams of the system: LLM providers and agent tools.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Message, ProviderResponse, ToolDefinition, ToolResult};

/// Sampling parameters for one chat-completion request.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".into(),
            temperature: 0.9,
            max_tokens: 1024,
        }
    }
}

/// An LLM chat-completion backend.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Send a conversation (plus available tool descriptors) and get back
    /// either text, tool-invocation requests, or both.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        params: &GenerateParams,
    ) -> Result<ProviderResponse>;

    /// Cheap liveness/credential check, used at startup for log output only.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// A capability exposed uniformly to every agent. Idempotent and
/// side-effect-free from the caller's perspective.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn definition(&self) -> ToolDefinition;

    /// Execute with the model-produced raw JSON argument string.
    async fn execute(&self, arguments: &str) -> Result<ToolResult>;
}
