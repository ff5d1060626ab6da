//! Search types and FTS5 query building.

use dietmate_core::types::DietCategory;

/// One retrieved chunk with its tags and BM25 rank.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub content: String,
    pub source_file: String,
    pub dietary_type: String,
    pub doc_type: String,
    /// FTS5 rank — lower is more relevant.
    pub score: f64,
}

/// Equality filter over chunk tags. Both conditions are conjoined when
/// present.
#[derive(Debug, Clone, Default)]
pub struct ChunkFilter {
    pub doc_type: Option<String>,
    pub dietary_type: Option<DietCategory>,
}

impl ChunkFilter {
    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn dietary_type(mut self, category: DietCategory) -> Self {
        self.dietary_type = Some(category);
        self
    }
}

/// Turn free text into a safe FTS5 MATCH expression: alphanumeric tokens,
/// each double-quoted, OR-joined. Returns None when no token survives.
pub fn build_match_query(query: &str) -> Option<String> {
    let tokens: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{t}\""))
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}
