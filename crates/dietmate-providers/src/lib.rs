//! # DietMate Providers
//!
//! LLM provider implementations for DietMate.
//!
//! All OpenAI-compatible providers (Gemini, OpenAI, Groq, Ollama, custom
//! endpoints) are handled by a single `OpenAiCompatibleProvider`,
//! distinguished only by endpoint URL, auth style, and API key.

pub mod openai_compatible;
pub mod provider_registry;

use dietmate_core::config::DietMateConfig;
use dietmate_core::error::{DietMateError, Result};
use dietmate_core::traits::Provider;

/// Create a provider from configuration.
pub fn create_provider(config: &DietMateConfig) -> Result<Box<dyn Provider>> {
    let provider_name = config.default_provider.as_str();

    match provider_name {
        // Custom endpoint: "custom:https://my-server.com/v1"
        other if other.starts_with("custom:") => Ok(Box::new(
            openai_compatible::OpenAiCompatibleProvider::custom(other, config),
        )),

        // All known OpenAI-compatible providers
        _ => {
            let registry = provider_registry::get_provider_config(provider_name)
                .ok_or_else(|| DietMateError::ProviderNotFound(provider_name.into()))?;
            Ok(Box::new(
                openai_compatible::OpenAiCompatibleProvider::from_registry(registry, config),
            ))
        }
    }
}

/// List all available provider names.
pub fn available_providers() -> Vec<&'static str> {
    let mut names = provider_registry::all_provider_names();
    names.push("custom");
    names
}
