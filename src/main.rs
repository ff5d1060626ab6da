//! # DietMate — diet advice chatbot
//!
//! Routes each console turn to one specialist diet agent (vegetarian,
//! non-vegetarian, vegan, or general), each backed by the recipe knowledge
//! base and a web-search fallback.
//!
//! Usage:
//!   dietmate                             # Start the chat loop
//!   dietmate --corpus-dir ./data/pdfs    # Ingest a different corpus
//!   dietmate -v                          # Debug logging

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use dietmate_agent::Dispatcher;
use dietmate_core::DietMateConfig;
use dietmate_core::traits::GenerateParams;
use dietmate_knowledge::{IngestOptions, KnowledgeStore};
use dietmate_tools::{KnowledgeSearchTool, ToolRegistry, WebSearchTool};

#[derive(Parser)]
#[command(name = "dietmate", version, about = "Diet advice chatbot")]
struct Cli {
    /// Config file path (default: ~/.dietmate/config.toml)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Recipe corpus root, one subdirectory per diet category
    #[arg(long)]
    corpus_dir: Option<String>,

    /// Persistent index directory
    #[arg(long)]
    index_dir: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => DietMateConfig::load_from(path)?,
        None => DietMateConfig::load()?,
    };
    if let Some(corpus_dir) = cli.corpus_dir {
        config.knowledge.corpus_dir = corpus_dir;
    }
    if let Some(index_dir) = cli.index_dir {
        config.knowledge.index_dir = index_dir;
    }

    // ── Knowledge base ─────────────────────────────────────
    tracing::info!("Initializing knowledge base (this may take a while the first time)...");
    let store = match KnowledgeStore::open(std::path::Path::new(&config.knowledge.index_dir)) {
        Ok(mut store) => {
            let options = IngestOptions {
                chunk_size: config.knowledge.chunk_size,
                chunk_overlap: config.knowledge.chunk_overlap,
            };
            match store.ingest(std::path::Path::new(&config.knowledge.corpus_dir), &options) {
                Ok(report) if !report.skipped => {
                    tracing::info!(
                        "Knowledge base ready: {} chunks from {} files",
                        report.chunks_added,
                        report.files_loaded
                    );
                }
                Ok(_) => tracing::info!("Knowledge base ready (existing index)"),
                Err(e) => tracing::error!("Ingest failed: {e}"),
            }
            Some(Arc::new(Mutex::new(store)))
        }
        Err(e) => {
            // Retrieval reports NotConfigured when used; the session still runs
            tracing::error!("Knowledge base unavailable: {e}");
            None
        }
    };

    // ── Web search ─────────────────────────────────────────
    let search_key = config.search.resolve_api_key();
    if search_key.is_some() {
        tracing::info!("Web search tool ready");
    } else {
        tracing::warn!("TAVILY_API_KEY not set. Web search will not be available.");
    }

    // ── Model provider ─────────────────────────────────────
    let provider: Arc<dyn dietmate_core::traits::Provider> =
        Arc::from(dietmate_providers::create_provider(&config)?);
    match provider.health_check().await {
        Ok(true) => tracing::info!("Provider '{}' ready", provider.name()),
        _ => tracing::warn!(
            "Provider '{}' has no credentials; model calls will fail",
            provider.name()
        ),
    }

    // ── Agents ─────────────────────────────────────────────
    let params = GenerateParams {
        model: config.default_model.clone(),
        temperature: config.default_temperature,
        max_tokens: config.max_tokens,
    };
    let top_k = config.knowledge.top_k;
    let dispatcher = Dispatcher::new(provider, params, || {
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(KnowledgeSearchTool::new(store.clone(), top_k)));
        tools.register(Box::new(WebSearchTool::new(search_key.clone())));
        tools
    });

    // ── Chat loop ──────────────────────────────────────────
    println!("DietMate started. Type 'exit' to quit.");
    let stdin = std::io::stdin();
    let mut history = Vec::new();

    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }

        // Turn-level error isolation: one failed turn never ends the session
        match dispatcher.run_turn(input, &mut history).await {
            Ok(reply) => println!("Bot: {reply}"),
            Err(e) => {
                tracing::error!("Turn failed: {e}");
                println!(
                    "Bot: I'm sorry, I couldn't process that request right now. \
                     Please try again or rephrase."
                );
            }
        }
    }

    Ok(())
}
