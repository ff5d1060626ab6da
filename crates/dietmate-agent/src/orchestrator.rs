//! Routing orchestrator — one structured-output model call per user turn.
//!
//! The decoder is strict-with-fallback: a clean or fenced JSON decision is
//! parsed into `RouteDecision`; anything else (a clarifying question, prose,
//! truncated JSON) degrades to a `general` decision carrying the raw reply.
//! Decoding NEVER fails — the model's output is uncontrolled, so the
//! fallback contract matters more than parse correctness.

use std::sync::Arc;

use dietmate_core::error::Result;
use dietmate_core::traits::{GenerateParams, Provider};
use dietmate_core::types::Message;
use dietmate_tools::ToolRegistry;
use serde::Deserialize;

use crate::personas;
use crate::Agent;

/// Routing target. Unknown or missing values decode to `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Vegetarian,
    NonVegetarian,
    Vegan,
    General,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Vegetarian => "vegetarian",
            Route::NonVegetarian => "non_vegetarian",
            Route::Vegan => "vegan",
            Route::General => "general",
        }
    }

    /// Strict parse; the caller decides what an unknown value falls back to.
    pub fn parse(s: &str) -> Option<Route> {
        match s.trim().to_lowercase().as_str() {
            "vegetarian" => Some(Route::Vegetarian),
            "non_vegetarian" | "non-vegetarian" => Some(Route::NonVegetarian),
            "vegan" => Some(Route::Vegan),
            "general" => Some(Route::General),
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structured output of one orchestrator invocation. Immutable after
/// creation, consumed exactly once by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    pub route: Route,
    pub dietary_preference: Option<String>,
    pub dietary_goal: Option<String>,
    /// Always normalized: trimmed entries, no empties, no literal "none".
    pub allergies: Vec<String>,
    pub meal_type: Option<String>,
    pub query_for_agent: String,
}

impl RouteDecision {
    /// The never-raise fallback: everything the model said becomes the
    /// general agent's query.
    fn general_fallback(raw: &str) -> Self {
        Self {
            route: Route::General,
            dietary_preference: None,
            dietary_goal: None,
            allergies: Vec::new(),
            meal_type: None,
            query_for_agent: raw.to_string(),
        }
    }
}

/// The decision shape as the model emits it, before normalization.
#[derive(Deserialize)]
struct RawDecision {
    next_agent: String,
    #[serde(default)]
    dietary_preference: Option<String>,
    #[serde(default)]
    dietary_goal: Option<String>,
    #[serde(default)]
    allergies: Option<String>,
    #[serde(default)]
    meal_type: Option<String>,
    query_for_agent: String,
}

/// Strip markdown code-fence wrappers the model may add around JSON.
fn strip_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    for prefix in ["```json", "```"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
            break;
        }
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest.trim_end();
    }
    s
}

/// "gluten, dairy" → ["gluten", "dairy"]; empty/absent/"none" → [].
fn normalize_allergies(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case("none"))
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Empty extracted slots become None.
fn normalize_slot(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Decode the model's raw reply into a decision. Never fails: anything not
/// decision-shaped becomes a general decision carrying the raw text.
pub fn parse_decision(raw: &str) -> RouteDecision {
    let stripped = strip_fences(raw);

    match serde_json::from_str::<RawDecision>(stripped) {
        Ok(decision) if !decision.query_for_agent.trim().is_empty() => {
            let route = Route::parse(&decision.next_agent).unwrap_or_else(|| {
                tracing::warn!(
                    "Unknown next_agent '{}', falling back to general",
                    decision.next_agent
                );
                Route::General
            });
            RouteDecision {
                route,
                dietary_preference: normalize_slot(decision.dietary_preference),
                dietary_goal: normalize_slot(decision.dietary_goal),
                allergies: normalize_allergies(decision.allergies),
                meal_type: normalize_slot(decision.meal_type),
                query_for_agent: decision.query_for_agent.trim().to_string(),
            }
        }
        Ok(_) => {
            tracing::debug!("Decision had an empty query_for_agent, treating as conversational");
            RouteDecision::general_fallback(raw)
        }
        Err(e) => {
            tracing::debug!("Orchestrator reply not decision-shaped ({e}), treating as conversational");
            RouteDecision::general_fallback(raw)
        }
    }
}

/// Phrases marking a general decision as a pure greeting/clarification turn
/// that should be echoed to the user without another model call.
const CLARIFICATION_MARKERS: [&str; 3] = [
    "help you with today",
    "what kind of diet information",
    "how can i assist you",
];

pub(crate) const DEFAULT_GREETING: &str = "What can I help you with today?";

/// True when the restated query is a greeting/clarification, not a task.
pub fn is_clarification(text: &str) -> bool {
    let lower = text.to_lowercase();
    CLARIFICATION_MARKERS.iter().any(|m| lower.contains(m))
}

/// The routing agent: a persona instructed to emit decisions, plus the
/// strict-with-fallback decoder.
pub struct Orchestrator {
    agent: Agent,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>, tools: ToolRegistry, params: GenerateParams) -> Self {
        Self {
            agent: Agent::new("orchestrator", personas::ORCHESTRATOR, provider, tools, params),
        }
    }

    /// Classify one user turn into a routing decision. Errors here are
    /// provider failures only; decoding problems never surface.
    pub async fn route(&self, query: &str, history: &[Message]) -> Result<RouteDecision> {
        let raw = self.agent.answer(query, history).await?;
        let decision = parse_decision(&raw);
        tracing::info!(
            route = %decision.route,
            query_for_agent = %decision.query_for_agent,
            "Orchestrator decision"
        );
        Ok(decision)
    }
}
