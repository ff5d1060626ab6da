//! Unified OpenAI-compatible provider.
//!
//! A single struct that handles chat completions for ALL OpenAI-compatible
//! APIs. Different providers are distinguished only by endpoint URL, auth
//! style, and API key.

use async_trait::async_trait;
use dietmate_core::config::DietMateConfig;
use dietmate_core::error::{DietMateError, Result};
use dietmate_core::traits::{GenerateParams, Provider};
use dietmate_core::types::{FunctionCall, Message, ProviderResponse, ToolCall, ToolDefinition, Usage};
use serde_json::{Value, json};

use crate::provider_registry::{AuthStyle, ProviderConfig};

/// A unified provider that works with any OpenAI-compatible API.
pub struct OpenAiCompatibleProvider {
    /// Provider name (e.g., "gemini", "openai", "ollama").
    name: String,
    /// API key for authentication.
    api_key: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    base_url: String,
    /// Path for chat completions (e.g., "/chat/completions").
    chat_path: String,
    /// Authentication style.
    auth_style: AuthStyle,
    /// HTTP client.
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    /// Create from a known provider config + DietMateConfig.
    ///
    /// Resolution order:
    /// - API key: `config.api_key` > env vars > empty
    /// - Base URL: env override > registry default
    pub fn from_registry(registry: &ProviderConfig, config: &DietMateConfig) -> Self {
        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            registry
                .env_keys
                .iter()
                .find_map(|key| std::env::var(key).ok())
                .unwrap_or_default()
        };

        let base_url = registry
            .base_url_env
            .and_then(|env_key| {
                let val = std::env::var(env_key).ok()?;
                // For OLLAMA_HOST-style overrides, append /v1 if not present
                if val.ends_with("/v1") {
                    Some(val)
                } else {
                    Some(format!("{}/v1", val.trim_end_matches('/')))
                }
            })
            .unwrap_or_else(|| registry.base_url.to_string());

        Self {
            name: registry.name.to_string(),
            api_key,
            base_url,
            chat_path: registry.chat_path.to_string(),
            auth_style: registry.auth_style,
            client: reqwest::Client::new(),
        }
    }

    /// Create for a custom endpoint (e.g., "custom:https://my-server.com/v1").
    pub fn custom(endpoint: &str, config: &DietMateConfig) -> Self {
        let base_url = endpoint
            .strip_prefix("custom:")
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string();

        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            std::env::var("CUSTOM_API_KEY").unwrap_or_default()
        };

        let auth_style = if api_key.is_empty() {
            AuthStyle::None
        } else {
            AuthStyle::Bearer
        };

        Self {
            name: "custom".to_string(),
            api_key,
            base_url,
            chat_path: "/chat/completions".to_string(),
            auth_style,
            client: reqwest::Client::new(),
        }
    }

    /// Build the auth header for the request.
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_style {
            AuthStyle::Bearer if !self.api_key.is_empty() => {
                req.header("Authorization", format!("Bearer {}", self.api_key))
            }
            _ => req,
        }
    }

    /// Parse a successful chat-completions response body.
    fn parse_response(json: &Value, allow_tools: bool) -> Result<ProviderResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| DietMateError::Provider("No choices in response".into()))?;

        let content = choice["message"]["content"].as_str().map(String::from);

        let tool_calls = if allow_tools
            && let Some(tc) = choice["message"]["tool_calls"].as_array()
        {
            tc.iter()
                .filter_map(|t| {
                    Some(ToolCall {
                        id: t["id"].as_str().unwrap_or("").to_string(),
                        r#type: "function".to_string(),
                        function: FunctionCall {
                            name: t["function"]["name"].as_str()?.to_string(),
                            arguments: t["function"]["arguments"].as_str()?.to_string(),
                        },
                    })
                })
                .collect()
        } else {
            vec![]
        };

        let usage = json["usage"].as_object().map(|u| Usage {
            prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u
                .get("completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        });

        Ok(ProviderResponse {
            content,
            tool_calls,
            finish_reason: choice["finish_reason"].as_str().map(String::from),
            usage,
        })
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        params: &GenerateParams,
    ) -> Result<ProviderResponse> {
        // For providers that require auth, check API key up front
        if self.auth_style != AuthStyle::None && self.api_key.is_empty() {
            return Err(DietMateError::ApiKeyMissing(self.name.clone()));
        }

        let mut body = json!({
            "model": params.model,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "messages": serde_json::to_value(messages).unwrap_or_default(),
        });

        if !tools.is_empty() {
            let tool_defs: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tool_defs);
        }

        let url = format!("{}{}", self.base_url, self.chat_path);
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        let req = self.apply_auth(req);

        let resp = req.send().await.map_err(|e| {
            DietMateError::Http(format!("{} connection failed ({}): {}", self.name, url, e))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();

            // Retry once WITHOUT tools if the model doesn't support function
            // calling. A capability downgrade, not a transient-failure retry.
            if status.as_u16() == 400
                && !tools.is_empty()
                && (text.contains("does not support tools")
                    || text.contains("tool_use is not supported")
                    || text.contains("does not support function"))
            {
                tracing::warn!(
                    "Model '{}' doesn't support tools — retrying without tools",
                    params.model
                );
                if let Some(m) = body.as_object_mut() {
                    m.remove("tools");
                }
                let retry_req = self
                    .client
                    .post(&url)
                    .header("Content-Type", "application/json")
                    .json(&body);
                let retry_req = self.apply_auth(retry_req);
                let retry_resp = retry_req.send().await.map_err(|e| {
                    DietMateError::Http(format!("{} retry failed: {}", self.name, e))
                })?;
                if !retry_resp.status().is_success() {
                    let rs = retry_resp.status();
                    let rt = retry_resp.text().await.unwrap_or_default();
                    return Err(DietMateError::Provider(format!(
                        "{} API error {} (retry without tools): {}",
                        self.name, rs, rt
                    )));
                }
                let json: Value = retry_resp
                    .json()
                    .await
                    .map_err(|e| DietMateError::Http(e.to_string()))?;
                return Self::parse_response(&json, false);
            }

            return Err(DietMateError::Provider(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| DietMateError::Http(e.to_string()))?;

        Self::parse_response(&json, true)
    }

    async fn health_check(&self) -> Result<bool> {
        // For cloud providers, just check if the API key is set
        if self.auth_style != AuthStyle::None {
            return Ok(!self.api_key.is_empty());
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_endpoint_parsing() {
        let config = DietMateConfig::default();
        let p = OpenAiCompatibleProvider::custom("custom:http://localhost:9000/v1/", &config);
        assert_eq!(p.base_url, "http://localhost:9000/v1");
        assert_eq!(p.name, "custom");
    }

    #[test]
    fn test_parse_response_text_only() {
        let json = json!({
            "choices": [{
                "message": { "content": "Hello there" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13 }
        });
        let resp = OpenAiCompatibleProvider::parse_response(&json, true).unwrap();
        assert_eq!(resp.content.as_deref(), Some("Hello there"));
        assert!(resp.tool_calls.is_empty());
        assert_eq!(resp.usage.unwrap().total_tokens, 13);
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let json = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "search_knowledge",
                            "arguments": "{\"query\":\"tofu\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let resp = OpenAiCompatibleProvider::parse_response(&json, true).unwrap();
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].function.name, "search_knowledge");
    }

    #[test]
    fn test_parse_response_no_choices() {
        let json = json!({ "choices": [] });
        assert!(OpenAiCompatibleProvider::parse_response(&json, true).is_err());
    }
}
