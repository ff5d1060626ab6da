//! Persistent FTS5 chunk store.

use std::path::{Path, PathBuf};

use dietmate_core::error::{DietMateError, Result};
use dietmate_core::types::DietCategory;
use rusqlite::Connection;

use crate::chunker::chunk_text;
use crate::search::{ChunkFilter, SearchResult, build_match_query};

/// Constant source-type marker stamped on every ingested chunk.
pub const DOC_TYPE_RECIPE: &str = "recipe_book";

/// Chunking parameters for one ingest pass.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 200,
        }
    }
}

/// Summary of one ingest pass.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// True when an existing index was found and nothing was done.
    pub skipped: bool,
    pub files_loaded: usize,
    pub files_failed: usize,
    pub chunks_added: usize,
}

/// The recipe knowledge base: chunks in a single FTS5 table, tagged with
/// their source file, diet category, and document type.
pub struct KnowledgeStore {
    conn: Connection,
    /// Whether the index directory already held data before this process
    /// opened it. Mere non-emptiness is the sole "already ingested" signal;
    /// changed chunking parameters do NOT invalidate an existing index.
    preexisting: bool,
}

impl KnowledgeStore {
    /// Open (or create) the store at `<index_dir>/chunks.db`.
    pub fn open(index_dir: &Path) -> Result<Self> {
        let preexisting = index_dir.exists()
            && index_dir
                .read_dir()
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false);

        std::fs::create_dir_all(index_dir)?;
        let db_path: PathBuf = index_dir.join("chunks.db");
        let conn = Connection::open(&db_path)
            .map_err(|e| DietMateError::Database(format!("Failed to open {db_path:?}: {e}")))?;
        Self::init_schema(&conn)?;

        Ok(Self { conn, preexisting })
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DietMateError::Database(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn,
            preexisting: false,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE VIRTUAL TABLE IF NOT EXISTS chunks USING fts5(
                content,
                source_file,
                dietary_type,
                doc_type
            );",
        )
        .map_err(|e| DietMateError::Database(format!("Failed to init schema: {e}")))?;
        Ok(())
    }

    /// Number of chunks in the index.
    pub fn chunk_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| DietMateError::Database(e.to_string()))?;
        Ok(count as usize)
    }

    /// Walk `<corpus_root>/<category>` for every diet category, chunk each
    /// readable document, and commit all chunks. Idempotent: when the index
    /// directory was already populated before open, this is a logged no-op.
    ///
    /// Unreadable files and missing category directories are skipped, never
    /// fatal to the pass.
    pub fn ingest(&mut self, corpus_root: &Path, options: &IngestOptions) -> Result<IngestReport> {
        if self.preexisting {
            tracing::info!(
                "Existing index found, skipping ingest ({} chunks). \
                 Delete the index directory to re-ingest.",
                self.chunk_count()?
            );
            return Ok(IngestReport {
                skipped: true,
                ..Default::default()
            });
        }

        let mut report = IngestReport::default();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DietMateError::Database(e.to_string()))?;

        for category in DietCategory::ALL {
            let dir = corpus_root.join(category.as_str());
            if !dir.is_dir() {
                tracing::warn!("Corpus directory {dir:?} not found, skipping {category}");
                continue;
            }

            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Cannot read {dir:?}: {e}, skipping {category}");
                    continue;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let text = match load_document(&path) {
                    Ok(Some(text)) => text,
                    Ok(None) => continue, // unsupported extension
                    Err(e) => {
                        tracing::error!("Failed to load {path:?}: {e}");
                        report.files_failed += 1;
                        continue;
                    }
                };

                let source_file = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                tracing::info!("Ingesting {source_file} ({category})");

                let mut inserted = 0;
                for chunk in chunk_text(&text, options.chunk_size, options.chunk_overlap) {
                    tx.execute(
                        "INSERT INTO chunks (content, source_file, dietary_type, doc_type)
                         VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![chunk, source_file, category.as_str(), DOC_TYPE_RECIPE],
                    )
                    .map_err(|e| DietMateError::Database(e.to_string()))?;
                    inserted += 1;
                }
                report.files_loaded += 1;
                report.chunks_added += inserted;
            }
        }

        tx.commit()
            .map_err(|e| DietMateError::Database(e.to_string()))?;

        tracing::info!(
            "Ingest complete: {} files, {} chunks ({} failed)",
            report.files_loaded,
            report.chunks_added,
            report.files_failed
        );
        // Subsequent ingest calls in the same process are no-ops too
        self.preexisting = report.chunks_added > 0;
        Ok(report)
    }

    /// Top-K chunks by BM25 relevance to `query`, restricted to chunks whose
    /// tags satisfy `filter`. An unmatchable query returns an empty list.
    pub fn search(&self, query: &str, filter: &ChunkFilter, k: usize) -> Result<Vec<SearchResult>> {
        let Some(match_expr) = build_match_query(query) else {
            return Ok(Vec::new());
        };

        let mut sql = String::from(
            "SELECT content, source_file, dietary_type, doc_type, rank
             FROM chunks WHERE chunks MATCH ?1",
        );
        let mut params: Vec<String> = vec![match_expr];

        if let Some(doc_type) = &filter.doc_type {
            params.push(doc_type.clone());
            sql.push_str(&format!(" AND doc_type = ?{}", params.len()));
        }
        if let Some(category) = filter.dietary_type {
            params.push(category.as_str().to_string());
            sql.push_str(&format!(" AND dietary_type = ?{}", params.len()));
        }
        sql.push_str(&format!(" ORDER BY rank LIMIT {}", k.max(1)));

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| DietMateError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params), |row| {
                Ok(SearchResult {
                    content: row.get(0)?,
                    source_file: row.get(1)?,
                    dietary_type: row.get(2)?,
                    doc_type: row.get(3)?,
                    score: row.get(4)?,
                })
            })
            .map_err(|e| DietMateError::Database(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| DietMateError::Database(e.to_string()))?);
        }
        Ok(results)
    }
}

/// Read one corpus document as plain text. Returns Ok(None) for unsupported
/// extensions.
fn load_document(path: &Path) -> Result<Option<String>> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => {
            let text = pdf_extract::extract_text(path)
                .map_err(|e| DietMateError::Knowledge(format!("PDF extraction failed: {e}")))?;
            Ok(Some(text))
        }
        "txt" | "md" => Ok(Some(std::fs::read_to_string(path)?)),
        _ => {
            tracing::debug!("Skipping unsupported file {path:?}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_corpus(root: &Path) {
        for (category, text) in [
            ("vegetarian", "Paneer tikka with grilled peppers and mint chutney."),
            ("vegan", "Tofu scramble breakfast bowl with spinach and turmeric."),
            ("non_vegetarian", "Grilled chicken breast with lemon and herbs."),
        ] {
            let dir = root.join(category);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("recipes.txt"), text).unwrap();
        }
    }

    #[test]
    fn test_ingest_and_count() {
        let corpus = tempfile::tempdir().unwrap();
        seed_corpus(corpus.path());

        let mut store = KnowledgeStore::in_memory().unwrap();
        let report = store
            .ingest(corpus.path(), &IngestOptions::default())
            .unwrap();
        assert!(!report.skipped);
        assert_eq!(report.files_loaded, 3);
        assert_eq!(report.files_failed, 0);
        assert_eq!(store.chunk_count().unwrap(), report.chunks_added);
        assert!(store.chunk_count().unwrap() >= 3);
    }

    #[test]
    fn test_missing_category_dir_is_skipped() {
        let corpus = tempfile::tempdir().unwrap();
        // Only one of three category directories exists
        let dir = corpus.path().join("vegan");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.txt"), "Chickpea curry with coconut milk.").unwrap();

        let mut store = KnowledgeStore::in_memory().unwrap();
        let report = store
            .ingest(corpus.path(), &IngestOptions::default())
            .unwrap();
        assert_eq!(report.files_loaded, 1);
    }

    #[test]
    fn test_category_filter_never_leaks() {
        let corpus = tempfile::tempdir().unwrap();
        seed_corpus(corpus.path());

        let mut store = KnowledgeStore::in_memory().unwrap();
        store
            .ingest(corpus.path(), &IngestOptions::default())
            .unwrap();

        // "grilled" appears in both vegetarian and non_vegetarian chunks
        let filter = ChunkFilter::default()
            .doc_type(DOC_TYPE_RECIPE)
            .dietary_type(DietCategory::Vegan);
        let results = store.search("grilled tofu scramble", &filter, 10).unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.dietary_type == "vegan"));
    }

    #[test]
    fn test_unfiltered_search_ranks_matches() {
        let corpus = tempfile::tempdir().unwrap();
        seed_corpus(corpus.path());

        let mut store = KnowledgeStore::in_memory().unwrap();
        store
            .ingest(corpus.path(), &IngestOptions::default())
            .unwrap();

        let results = store
            .search("chicken", &ChunkFilter::default(), 5)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].dietary_type, "non_vegetarian");
        assert_eq!(results[0].doc_type, DOC_TYPE_RECIPE);
    }

    #[test]
    fn test_empty_query_returns_empty() {
        let store = KnowledgeStore::in_memory().unwrap();
        let results = store.search("???", &ChunkFilter::default(), 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_reingest_against_populated_index_is_noop() {
        let corpus = tempfile::tempdir().unwrap();
        seed_corpus(corpus.path());
        let index = tempfile::tempdir().unwrap();

        let count_after_first = {
            let mut store = KnowledgeStore::open(index.path()).unwrap();
            store
                .ingest(corpus.path(), &IngestOptions::default())
                .unwrap();
            store.chunk_count().unwrap()
        };
        assert!(count_after_first > 0);

        // Second open sees a non-empty index directory and must not re-ingest
        let mut store = KnowledgeStore::open(index.path()).unwrap();
        let report = store
            .ingest(corpus.path(), &IngestOptions::default())
            .unwrap();
        assert!(report.skipped);
        assert_eq!(store.chunk_count().unwrap(), count_after_first);
    }
}
