//! Knowledge retrieval tool — filtered search over the recipe index.

use std::sync::Arc;

use async_trait::async_trait;
use dietmate_core::error::{DietMateError, Result};
use dietmate_core::traits::Tool;
use dietmate_core::types::{DietCategory, ToolDefinition, ToolResult};
use dietmate_knowledge::{ChunkFilter, DOC_TYPE_RECIPE, KnowledgeStore};
use serde_json::json;
use tokio::sync::Mutex;

/// Explicit "nothing matched" sentinel, distinct from an error.
pub const NO_RESULTS: &str = "No relevant information found in the knowledge base.";

pub struct KnowledgeSearchTool {
    store: Option<Arc<Mutex<KnowledgeStore>>>,
    top_k: usize,
}

impl KnowledgeSearchTool {
    pub fn new(store: Option<Arc<Mutex<KnowledgeStore>>>, top_k: usize) -> Self {
        Self { store, top_k }
    }
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        "search_knowledge"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_knowledge".into(),
            description: "Retrieve recipes, nutritional facts, and diet plans from the \
                          internal recipe knowledge base. Pass dietary_filter \
                          ('vegetarian', 'non_vegetarian', or 'vegan') to restrict \
                          results to one recipe book."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "What to look up" },
                    "dietary_filter": {
                        "type": "string",
                        "enum": ["vegetarian", "non_vegetarian", "vegan"],
                        "description": "Optional diet category restriction"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: &str) -> Result<ToolResult> {
        let store = self.store.as_ref().ok_or_else(|| {
            DietMateError::NotConfigured(
                "search_knowledge: knowledge store was never initialized".into(),
            )
        })?;

        let args: serde_json::Value = serde_json::from_str(arguments)
            .unwrap_or_else(|_| json!({ "query": arguments }));
        let query = args["query"].as_str().unwrap_or(arguments);

        // Document-type tag is mandatory; the category tag is conjoined
        // when the model supplies one.
        let mut filter = ChunkFilter::default().doc_type(DOC_TYPE_RECIPE);
        if let Some(raw) = args["dietary_filter"].as_str()
            && !raw.is_empty()
        {
            match raw.parse::<DietCategory>() {
                Ok(category) => filter = filter.dietary_type(category),
                Err(_) => {
                    tracing::warn!("Ignoring unknown dietary_filter: {raw}");
                }
            }
        }

        tracing::info!(
            "Retrieving from knowledge base for '{query}' (filter: {:?})",
            filter.dietary_type
        );

        let results = store.lock().await.search(query, &filter, self.top_k)?;

        let output = if results.is_empty() {
            NO_RESULTS.to_string()
        } else {
            results
                .iter()
                .map(|r| r.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        Ok(ToolResult {
            tool_call_id: String::new(),
            output,
        })
    }
}
