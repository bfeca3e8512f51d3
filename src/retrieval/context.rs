//! Context assembler for retrieval-augmented prompts
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::errors::Result;
use crate::retrieval::payload::PayloadSchema;
use crate::services::ServiceRegistry;
use crate::vector_index::SearchHit;

/// Returned when the index has no matches for the query
pub const NO_RESULTS_CONTEXT: &str =
    "No relevant documentation found. Please ensure the knowledge base has been populated.";

/// Prefix of the context string produced when retrieval fails
pub const ERROR_PREFIX: &str = "Error retrieving context: ";

/// Placed between formatted blocks
pub const BLOCK_SEPARATOR: &str = "\n---\n";

/// Number of hits requested when the caller has no preference
pub const DEFAULT_TOP_K: usize = 5;

/// One formatted, source-attributed passage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBlock {
    /// 1-based position in the index's result list (skipped hits keep their slot)
    pub rank: usize,
    pub score: f32,
    pub source: String,
    pub text: String,
}

impl fmt::Display for ContextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[Source {} - Score: {:.3} - {}]",
            self.rank, self.score, self.source
        )?;
        writeln!(f, "{}", self.text)
    }
}

/// Outcome of a successful retrieval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RetrievedContext {
    /// The index returned hits; `blocks` holds those with usable text
    Found {
        blocks: Vec<ContextBlock>,
        hits: usize,
    },
    /// The index returned nothing
    Empty,
}

impl RetrievedContext {
    /// Prompt-ready context string
    pub fn render(&self) -> String {
        match self {
            RetrievedContext::Found { blocks, .. } => blocks
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(BLOCK_SEPARATOR),
            RetrievedContext::Empty => NO_RESULTS_CONTEXT.to_string(),
        }
    }

    pub fn block_count(&self) -> usize {
        match self {
            RetrievedContext::Found { blocks, .. } => blocks.len(),
            RetrievedContext::Empty => 0,
        }
    }
}

/// Embeds a query, searches the index, and formats the matches
#[derive(Clone)]
pub struct ContextAssembler {
    services: Arc<ServiceRegistry>,
    schema: PayloadSchema,
}

impl ContextAssembler {
    pub fn new(services: Arc<ServiceRegistry>, schema: PayloadSchema) -> Self {
        Self { services, schema }
    }

    /// Retrieve and format context, keeping failures visible to the caller
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<RetrievedContext> {
        let embedder = self.services.embedder().await?;
        let index = self.services.index().await?;

        tracing::info!(query = %preview(query), "Generating embedding for query");
        let vector = embedder.encode_one(query).await?;

        tracing::info!(top_k, "Searching for similar documents");
        let hits = index.search(&vector, top_k).await;

        if hits.is_empty() {
            tracing::warn!("No results found in vector database");
            return Ok(RetrievedContext::Empty);
        }

        let blocks = self.assemble(&hits);
        tracing::info!(
            hits = hits.len(),
            blocks = blocks.len(),
            "Retrieved documents"
        );

        Ok(RetrievedContext::Found {
            blocks,
            hits: hits.len(),
        })
    }

    /// Context string for the prompt; never fails.
    ///
    /// Retrieval errors come back as `"Error retrieving context: <message>"`.
    pub async fn retrieve_context(&self, query: &str, top_k: usize) -> String {
        match self.retrieve(query, top_k).await {
            Ok(context) => {
                let text = context.render();
                tracing::debug!(length = text.len(), "Assembled context");
                text
            }
            Err(e) => {
                tracing::error!(error = %e, "Error retrieving context");
                format!("{}{}", ERROR_PREFIX, e)
            }
        }
    }

    /// Turn hits into blocks, dropping those without text
    pub fn assemble(&self, hits: &[SearchHit]) -> Vec<ContextBlock> {
        hits.iter()
            .enumerate()
            .filter_map(|(idx, hit)| {
                let text = self.schema.resolve_text(&hit.payload);
                if text.is_empty() {
                    return None;
                }
                Some(ContextBlock {
                    rank: idx + 1,
                    score: hit.score,
                    source: self.schema.resolve_source(&hit.payload),
                    text,
                })
            })
            .collect()
    }
}

/// First 50 characters of the query, for logs
fn preview(query: &str) -> String {
    let mut shown: String = query.chars().take(50).collect();
    if shown.len() < query.len() {
        shown.push_str("...");
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingProvider;
    use crate::vector_index::{Distance, InMemoryIndex, VectorIndex};
    use quickcheck_macros::quickcheck;
    use serde_json::{json, Map, Value as JsonValue};

    fn hit(score: f32, payload: JsonValue) -> SearchHit {
        SearchHit {
            score,
            payload: payload.as_object().cloned().unwrap_or_default(),
        }
    }

    fn assembler() -> ContextAssembler {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(crate::services::tests::FixedEmbedder);
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryIndex::new(2, Distance::Cosine));
        ContextAssembler::new(
            Arc::new(ServiceRegistry::with_providers(embedder, index)),
            PayloadSchema::default(),
        )
    }

    #[test]
    fn test_block_format() {
        let block = ContextBlock {
            rank: 2,
            score: 0.87654,
            source: "fastapi/routing.md".to_string(),
            text: "Use APIRouter".to_string(),
        };
        assert_eq!(
            block.to_string(),
            "[Source 2 - Score: 0.877 - fastapi/routing.md]\nUse APIRouter\n"
        );
    }

    #[test]
    fn test_render_joins_with_separator() {
        let hits = vec![
            hit(0.9, json!({"text": "first", "source": "a.md"})),
            hit(0.8, json!({"content": "second"})),
        ];
        let blocks = assembler().assemble(&hits);
        let rendered = RetrievedContext::Found { blocks, hits: 2 }.render();

        assert_eq!(
            rendered,
            "[Source 1 - Score: 0.900 - a.md]\nfirst\n\
             \n---\n\
             [Source 2 - Score: 0.800 - Unknown]\nsecond\n"
        );
    }

    #[test]
    fn test_skipped_hits_keep_original_rank() {
        let hits = vec![
            hit(0.9, json!({"text": "first"})),
            hit(0.8, json!({"source": "empty.md"})),
            hit(0.7, json!({"text": "third"})),
        ];
        let blocks = assembler().assemble(&hits);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].rank, 1);
        assert_eq!(blocks[1].rank, 3);
        assert_eq!(blocks[1].text, "third");
    }

    #[test]
    fn test_empty_renders_sentinel() {
        assert_eq!(RetrievedContext::Empty.render(), NO_RESULTS_CONTEXT);
        assert_eq!(RetrievedContext::Empty.block_count(), 0);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(80);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), 53);
        assert!(shown.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }

    #[quickcheck]
    fn prop_one_block_per_non_empty_text(texts: Vec<String>) -> bool {
        let hits: Vec<SearchHit> = texts
            .iter()
            .map(|t| {
                let mut payload = Map::new();
                payload.insert("text".into(), JsonValue::String(t.clone()));
                SearchHit { score: 0.5, payload }
            })
            .collect();

        let blocks = assembler().assemble(&hits);
        let expected = texts.iter().filter(|t| !t.is_empty()).count();
        blocks.len() == expected && blocks.windows(2).all(|w| w[0].rank < w[1].rank)
    }
}
