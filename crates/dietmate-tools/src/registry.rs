//! Tool registry — name-indexed tool lookup and definition listing.

use dietmate_core::traits::Tool;
use dietmate_core::types::ToolDefinition;

/// A set of tools bound to one agent.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Find a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// All tool definitions, for advertising to the model.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Validate that a tool call carries every required argument. An explicit
/// JSON null counts as missing.
pub fn validate_args(definition: &ToolDefinition, args: &serde_json::Value) -> Result<(), String> {
    let required = definition
        .parameters
        .get("required")
        .and_then(|r| r.as_array());
    for key in required.into_iter().flatten().filter_map(|k| k.as_str()) {
        if args.get(key).is_none_or(serde_json::Value::is_null) {
            return Err(format!("Missing required argument: {key}"));
        }
    }
    Ok(())
}
