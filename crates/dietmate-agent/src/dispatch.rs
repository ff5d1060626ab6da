//! The dispatch graph: orchestrator entry, conditional edge to exactly one
//! specialist, terminal after the specialist answers.
//!
//! The transition is a pure exhaustive match on `RouteDecision.route`; a
//! multi-turn conversation re-enters at the orchestrator with accumulated
//! history on the next user message.

use std::sync::Arc;

use dietmate_core::error::Result;
use dietmate_core::traits::{GenerateParams, Provider};
use dietmate_core::types::Message;
use dietmate_tools::ToolRegistry;

use crate::orchestrator::{DEFAULT_GREETING, Orchestrator, Route, is_clarification};
use crate::{Agent, personas};

/// The fixed graph: one orchestrator, four specialists.
pub struct Dispatcher {
    orchestrator: Orchestrator,
    vegetarian: Agent,
    non_vegetarian: Agent,
    vegan: Agent,
    general: Agent,
}

impl Dispatcher {
    /// Build the whole graph. `make_tools` is called once per agent so each
    /// gets its own registry over the same shared backing services.
    pub fn new(
        provider: Arc<dyn Provider>,
        params: GenerateParams,
        mut make_tools: impl FnMut() -> ToolRegistry,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(provider.clone(), make_tools(), params.clone()),
            vegetarian: Agent::new(
                "vegetarian",
                personas::VEGETARIAN,
                provider.clone(),
                make_tools(),
                params.clone(),
            ),
            non_vegetarian: Agent::new(
                "non_vegetarian",
                personas::NON_VEGETARIAN,
                provider.clone(),
                make_tools(),
                params.clone(),
            ),
            vegan: Agent::new(
                "vegan",
                personas::VEGAN,
                provider.clone(),
                make_tools(),
                params.clone(),
            ),
            general: Agent::new("general", personas::GENERAL, provider, make_tools(), params),
        }
    }

    /// Process one user turn start-to-finish: route, dispatch to exactly one
    /// specialist, append the exchange to `history`, return the reply.
    pub async fn run_turn(&self, input: &str, history: &mut Vec<Message>) -> Result<String> {
        let decision = self.orchestrator.route(input, history).await?;
        history.push(Message::user(input));

        // A pure greeting/clarification turn ends here: echo it instead of
        // spending another model call on the general agent.
        if decision.route == Route::General && is_clarification(&decision.query_for_agent) {
            let shown = if decision.query_for_agent.contains("next_agent")
                && decision.query_for_agent.contains("query_for_agent")
            {
                // A leaked raw decision is never shown to the user
                DEFAULT_GREETING.to_string()
            } else {
                decision.query_for_agent.clone()
            };
            tracing::info!("Orchestrator issued a clarification: {}", shown);
            history.push(Message::assistant(&shown));
            return Ok(shown);
        }

        tracing::info!("Routing to: {}", decision.route);
        history.push(Message::assistant(format!(
            "Routing you to the {} agent for '{}'.",
            decision.route, decision.query_for_agent
        )));

        let handler = match decision.route {
            Route::Vegetarian => &self.vegetarian,
            Route::NonVegetarian => &self.non_vegetarian,
            Route::Vegan => &self.vegan,
            Route::General => &self.general,
        };

        let reply = handler.answer(&decision.query_for_agent, history).await?;
        history.push(Message::assistant(&reply));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::ScriptedProvider;

    /// One scripted provider per agent so tests can see exactly which
    /// specialist ran.
    struct Graph {
        dispatcher: Dispatcher,
        orchestrator: Arc<ScriptedProvider>,
        vegetarian: Arc<ScriptedProvider>,
        non_vegetarian: Arc<ScriptedProvider>,
        vegan: Arc<ScriptedProvider>,
        general: Arc<ScriptedProvider>,
    }

    fn graph(orchestrator_reply: &str, specialist_reply: &str) -> Graph {
        let orchestrator = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text(
            orchestrator_reply,
        )]));
        let vegetarian = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text(
            specialist_reply,
        )]));
        let non_vegetarian = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text(
            specialist_reply,
        )]));
        let vegan = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text(
            specialist_reply,
        )]));
        let general = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text(
            specialist_reply,
        )]));

        let params = GenerateParams::default();
        let dispatcher = Dispatcher {
            orchestrator: Orchestrator::new(
                orchestrator.clone(),
                ToolRegistry::new(),
                params.clone(),
            ),
            vegetarian: Agent::new(
                "vegetarian",
                personas::VEGETARIAN,
                vegetarian.clone(),
                ToolRegistry::new(),
                params.clone(),
            ),
            non_vegetarian: Agent::new(
                "non_vegetarian",
                personas::NON_VEGETARIAN,
                non_vegetarian.clone(),
                ToolRegistry::new(),
                params.clone(),
            ),
            vegan: Agent::new(
                "vegan",
                personas::VEGAN,
                vegan.clone(),
                ToolRegistry::new(),
                params.clone(),
            ),
            general: Agent::new(
                "general",
                personas::GENERAL,
                general.clone(),
                ToolRegistry::new(),
                params,
            ),
        };

        Graph {
            dispatcher,
            orchestrator,
            vegetarian,
            non_vegetarian,
            vegan,
            general,
        }
    }

    #[tokio::test]
    async fn test_vegan_decision_invokes_only_vegan_handler() {
        let g = graph(
            r#"{"next_agent": "vegan", "query_for_agent": "vegan breakfast ideas"}"#,
            "Try a tofu scramble.",
        );
        let mut history = Vec::new();
        let reply = g
            .dispatcher
            .run_turn("I want a vegan breakfast idea", &mut history)
            .await
            .unwrap();

        assert_eq!(reply, "Try a tofu scramble.");
        assert_eq!(g.orchestrator.request_count(), 1);
        assert_eq!(g.vegan.request_count(), 1);
        assert_eq!(g.vegetarian.request_count(), 0);
        assert_eq!(g.non_vegetarian.request_count(), 0);
        assert_eq!(g.general.request_count(), 0);

        // The specialist received the restated query, not the raw input
        let vegan_requests = g.vegan.requests.lock().unwrap();
        assert_eq!(
            vegan_requests[0].last().unwrap().content,
            "vegan breakfast ideas"
        );
    }

    #[tokio::test]
    async fn test_unrecognized_route_falls_back_to_general() {
        let g = graph(
            r#"{"next_agent": "keto", "query_for_agent": "keto dinner plan"}"#,
            "Here is a general answer.",
        );
        let mut history = Vec::new();
        g.dispatcher
            .run_turn("keto dinner please", &mut history)
            .await
            .unwrap();

        assert_eq!(g.general.request_count(), 1);
        assert_eq!(g.vegan.request_count(), 0);
    }

    #[tokio::test]
    async fn test_clarification_skips_all_handlers() {
        let g = graph(
            r#"{"next_agent": "general", "query_for_agent": "What can I help you with today?"}"#,
            "unused",
        );
        let mut history = Vec::new();
        let reply = g.dispatcher.run_turn("hello", &mut history).await.unwrap();

        assert_eq!(reply, "What can I help you with today?");
        // No specialist model call was spent on a pure greeting turn
        assert_eq!(g.general.request_count(), 0);
        assert_eq!(history.len(), 2); // user + echoed assistant
    }

    #[tokio::test]
    async fn test_leaked_decision_json_replaced_with_greeting() {
        let leaked = r#"{"next_agent": "general", "query_for_agent": "how can I assist you: {\"next_agent\": \"x\", \"query_for_agent\": \"y\"}"}"#;
        let g = graph(leaked, "unused");
        let mut history = Vec::new();
        let reply = g.dispatcher.run_turn("hi", &mut history).await.unwrap();
        assert_eq!(reply, DEFAULT_GREETING);
    }

    #[tokio::test]
    async fn test_prose_reply_routes_to_general_handler_when_not_clarification() {
        let g = graph(
            "Quinoa is a complete protein.",
            "General agent response.",
        );
        let mut history = Vec::new();
        let reply = g
            .dispatcher
            .run_turn("is quinoa a protein?", &mut history)
            .await
            .unwrap();
        // Prose fallback is not a clarification phrase, so the general
        // handler runs with the raw reply as its query
        assert_eq!(reply, "General agent response.");
        assert_eq!(g.general.request_count(), 1);
    }

    #[tokio::test]
    async fn test_exactly_one_decision_and_handler_per_turn() {
        let g = graph(
            r#"{"next_agent": "non_vegetarian", "query_for_agent": "chicken dinner for muscle gain"}"#,
            "Grilled chicken with rice.",
        );
        let mut history = Vec::new();
        g.dispatcher
            .run_turn("non-veg dinner, bulking", &mut history)
            .await
            .unwrap();

        let total_specialist_calls = g.vegetarian.request_count()
            + g.non_vegetarian.request_count()
            + g.vegan.request_count()
            + g.general.request_count();
        assert_eq!(total_specialist_calls, 1);
        assert_eq!(g.orchestrator.request_count(), 1);
    }

    /// End-to-end over the scripted provider: vegan breakfast query routes
    /// to the vegan handler and the reply stays free of animal products.
    #[tokio::test]
    async fn test_vegan_end_to_end_reply_has_no_banned_terms() {
        let g = graph(
            r#"{"next_agent": "vegan", "meal_type": "breakfast", "query_for_agent": "vegan breakfast ideas"}"#,
            "Tofu scramble with spinach, or overnight oats with chia, berries, and maple syrup.",
        );
        let mut history = Vec::new();
        let reply = g
            .dispatcher
            .run_turn("I want a vegan breakfast idea", &mut history)
            .await
            .unwrap();

        let banned = ["chicken", "beef", "pork", "fish", "egg", "milk", "cheese", "honey"];
        let lower = reply.to_lowercase();
        for term in banned {
            assert!(!lower.contains(term), "banned term '{term}' in: {reply}");
        }
        assert_eq!(g.vegan.request_count(), 1);
    }
}
