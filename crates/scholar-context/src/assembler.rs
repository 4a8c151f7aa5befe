//! Retrieval-augmented context assembly.

use tracing::debug;

use scholar_core::Result;

use crate::embedding::EmbeddingProvider;
use crate::index::{TextChunk, VectorIndex};

/// Separator placed between chunks in an assembled context string.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Assembles a bounded context string for a query from indexed chunks.
///
/// Owns the embedding provider and the index it retrieves from. Chunking
/// granularity (paragraphs, fixed windows) is the caller's choice — chunks
/// are consumed as given. Indexing takes `&mut self` and assembly `&self`,
/// so one assembler is never queried mid-build.
pub struct ContextAssembler<E: EmbeddingProvider> {
    /// Embedding provider used for chunks and queries.
    provider: E,
    /// Index of chunks available for retrieval.
    index: VectorIndex,
}

impl<E: EmbeddingProvider> ContextAssembler<E> {
    /// Creates an assembler with an empty index.
    pub fn new(provider: E) -> Self {
        Self {
            provider,
            index: VectorIndex::new(),
        }
    }

    /// Embeds and indexes pre-chunked text from one source document.
    ///
    /// Returns the number of chunks indexed. Repeated calls append to the
    /// index; the per-chunk failure semantics of [`VectorIndex::build`]
    /// apply.
    ///
    /// # Errors
    ///
    /// Returns the first embedding failure; already-indexed chunks stay
    /// available.
    pub async fn index_document(
        &mut self,
        source_doc_id: &str,
        chunks: Vec<String>,
    ) -> Result<usize> {
        let chunks: Vec<TextChunk> = chunks
            .into_iter()
            .map(|text| TextChunk::new(text, source_doc_id))
            .collect();
        let indexed = chunks.len();

        self.index.build(&self.provider, chunks).await?;
        debug!(indexed, source_doc_id, "Indexed document chunks");
        Ok(indexed)
    }

    /// Builds a context string of the `top_k` chunks most relevant to
    /// `query`, most relevant first, joined by [`CONTEXT_SEPARATOR`] and
    /// bounded by `max_chars`.
    ///
    /// The bound is honored at chunk boundaries: a chunk that does not fit
    /// whole is dropped along with everything ranked below it, so the result
    /// never contains a truncated fragment. An empty index yields an empty
    /// string — "no context available" — and the caller proceeds without
    /// retrieval augmentation.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query fails or `top_k` is zero.
    pub async fn assemble(
        &self,
        query: &str,
        top_k: usize,
        max_chars: usize,
    ) -> Result<String> {
        if self.index.is_empty() {
            debug!("No chunks indexed, proceeding without retrieval context");
            return Ok(String::new());
        }

        let query_embedding = self.provider.embed(query).await?;
        let ranked = self.index.query(&query_embedding, top_k)?;

        let mut context = String::new();
        let mut used_chars = 0usize;
        for scored in &ranked {
            let chunk_chars = scored.chunk.text.chars().count();
            let needed = if context.is_empty() {
                chunk_chars
            } else {
                used_chars + CONTEXT_SEPARATOR.len() + chunk_chars
            };
            if needed > max_chars {
                break;
            }
            if !context.is_empty() {
                context.push_str(CONTEXT_SEPARATOR);
            }
            context.push_str(&scored.chunk.text);
            used_chars = needed;
        }

        debug!(
            retrieved = ranked.len(),
            used_chars, "Assembled retrieval context"
        );
        Ok(context)
    }

    /// Read access to the underlying index.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingClient;

    fn ranked_mock() -> MockEmbeddingClient {
        MockEmbeddingClient::new()
            .with_vector("query", vec![1.0, 0.0])
            .with_vector("best match", vec![1.0, 0.0])
            .with_vector("close match", vec![0.9, 0.4])
            .with_vector("unrelated", vec![0.0, 1.0])
    }

    async fn ranked_assembler() -> ContextAssembler<MockEmbeddingClient> {
        let mut assembler = ContextAssembler::new(ranked_mock());
        let chunks = vec![
            "unrelated".to_owned(),
            "close match".to_owned(),
            "best match".to_owned(),
        ];
        assembler.index_document("notes.pdf", chunks).await.unwrap();
        assembler
    }

    #[tokio::test]
    async fn test_assemble_orders_most_relevant_first() {
        let assembler = ranked_assembler().await;
        let context = assembler.assemble("query", 3, 1000).await.unwrap();
        assert_eq!(context, "best match\n\nclose match\n\nunrelated");
    }

    #[tokio::test]
    async fn test_assemble_respects_top_k() {
        let assembler = ranked_assembler().await;
        let context = assembler.assemble("query", 2, 1000).await.unwrap();
        assert_eq!(context, "best match\n\nclose match");
    }

    #[tokio::test]
    async fn test_truncation_happens_at_chunk_boundaries() {
        let assembler = ranked_assembler().await;

        // "best match" (10) + separator (2) + "close match" (11) = 23 chars;
        // a 20-char budget keeps only the first chunk.
        let context = assembler.assemble("query", 3, 20).await.unwrap();
        assert_eq!(context, "best match");
        assert!(context.chars().count() <= 20);
    }

    #[tokio::test]
    async fn test_output_never_exceeds_max_chars() {
        let assembler = ranked_assembler().await;
        for max_chars in [0, 5, 10, 12, 23, 24, 100] {
            let context = assembler.assemble("query", 3, max_chars).await.unwrap();
            assert!(
                context.chars().count() <= max_chars,
                "budget {max_chars} exceeded: {context:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_oversized_first_chunk_yields_empty_context() {
        let assembler = ranked_assembler().await;
        let context = assembler.assemble("query", 3, 4).await.unwrap();
        assert_eq!(context, "");
    }

    #[tokio::test]
    async fn test_empty_index_yields_empty_context() {
        let assembler = ContextAssembler::new(MockEmbeddingClient::new());
        let context = assembler.assemble("query", 5, 1000).await.unwrap();
        assert_eq!(context, "");
    }

    #[tokio::test]
    async fn test_index_document_counts_chunks() {
        let mut assembler = ContextAssembler::new(MockEmbeddingClient::new());
        let indexed = assembler
            .index_document("doc", vec!["alpha".to_owned(), "beta".to_owned()])
            .await
            .unwrap();
        assert_eq!(indexed, 2);
        assert_eq!(assembler.index().len(), 2);
    }
}
