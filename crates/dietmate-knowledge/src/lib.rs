//! # DietMate Knowledge Base
//!
//! Lightweight RAG over the recipe corpus — no vector DB, no embeddings.
//!
//! ## Design
//! - **SQLite FTS5** for full-text search (built-in, zero setup)
//! - **BM25 scoring** — relevance ranking without embeddings
//! - **Chunking** — fixed max size with fixed overlap (defaults 1500/200 chars)
//! - **Category tags** — every chunk carries its diet category and a constant
//!   document-type marker, both filterable at query time
//!
//! ## How it works
//! ```text
//! data/recipe_pdfs/{vegetarian,vegan,non_vegetarian}/*.pdf
//!   ↓ ingest (once, skipped when the index dir is already populated)
//! chunks.db (FTS5 table, one row per chunk)
//!   ↓ search("vegan breakfast", filter: dietary_type=vegan)
//! Top-K chunks, BM25-ranked, never crossing the category filter
//! ```

pub mod chunker;
pub mod search;
pub mod store;

pub use search::{ChunkFilter, SearchResult};
pub use store::{IngestOptions, IngestReport, KnowledgeStore, DOC_TYPE_RECIPE};
