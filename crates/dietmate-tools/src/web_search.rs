//! Web search tool — general web lookup via the Tavily search API.
//!
//! Requires a TAVILY_API_KEY (or `[search] api_key` in config). Without one
//! the tool stays registered but every invocation fails with NotConfigured.

use async_trait::async_trait;
use dietmate_core::error::{DietMateError, Result};
use dietmate_core::traits::Tool;
use dietmate_core::types::{ToolDefinition, ToolResult};
use serde_json::json;

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

pub struct WebSearchTool {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("DietMate/0.1")
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { api_key, client }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "web_search".into(),
            description: "Perform a general web search. Useful for current events, \
                          general nutrition facts, or anything not in the recipe \
                          knowledge base."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            DietMateError::NotConfigured(
                "web_search: no Tavily API key was provided at startup".into(),
            )
        })?;

        let args: serde_json::Value = serde_json::from_str(arguments)
            .unwrap_or_else(|_| json!({ "query": arguments }));
        let query = args["query"].as_str().unwrap_or(arguments);

        tracing::info!("Performing web search for: {query}");

        let body = json!({
            "api_key": api_key,
            "query": query,
            "max_results": 5,
            "include_answer": true,
        });

        let resp = self
            .client
            .post(TAVILY_ENDPOINT)
            .json(&body)
            .send()
            .await
            .map_err(|e| DietMateError::Tool(format!("Search failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DietMateError::Tool(format!(
                "Search API error {status}: {text}"
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DietMateError::Tool(format!("Read failed: {e}")))?;

        let output = format_results(&json, query);

        Ok(ToolResult {
            tool_call_id: String::new(),
            output,
        })
    }
}

fn format_results(json: &serde_json::Value, query: &str) -> String {
    let mut out = String::new();

    if let Some(answer) = json["answer"].as_str()
        && !answer.is_empty()
    {
        out.push_str(answer);
        out.push_str("\n\n");
    }

    if let Some(results) = json["results"].as_array() {
        for (i, r) in results.iter().enumerate() {
            let title = r["title"].as_str().unwrap_or("");
            let content = r["content"].as_str().unwrap_or("");
            let url = r["url"].as_str().unwrap_or("");
            out.push_str(&format!("{}. {title}\n   {content}\n   {url}\n\n", i + 1));
        }
    }

    if out.trim().is_empty() {
        format!("No results found for: {query}")
    } else {
        out
    }
}
