//! In-memory vector index over text chunks.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use scholar_core::{Error, Result};

use crate::embedding::{Embedding, EmbeddingProvider};

/// Unique identifier for an indexed text chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkId(Uuid);

impl ChunkId {
    /// Creates a new random chunk ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChunkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A bounded unit of source text, indexed and retrieved as a whole.
///
/// Immutable once created; owned by the index after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    /// Opaque chunk handle.
    pub id: ChunkId,
    /// Chunk text.
    pub text: String,
    /// Identifier of the source document this chunk came from.
    pub source_doc_id: String,
}

impl TextChunk {
    /// Creates a chunk with a fresh ID.
    pub fn new(text: impl Into<String>, source_doc_id: impl Into<String>) -> Self {
        Self {
            id: ChunkId::new(),
            text: text.into(),
            source_doc_id: source_doc_id.into(),
        }
    }
}

/// A retrieved chunk with its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: TextChunk,
    /// Cosine similarity to the query vector, in [-1, 1].
    pub similarity: f32,
}

/// An indexed chunk with its embedding, in insertion order.
#[derive(Debug, Clone)]
struct IndexEntry {
    /// The indexed chunk.
    chunk: TextChunk,
    /// Embedding of the chunk text.
    embedding: Embedding,
}

/// In-memory store of `(chunk, embedding)` pairs with top-k cosine query.
///
/// The index is append-only while building and read-only while querying;
/// the `&mut`/`&` receivers enforce that a single index is never queried
/// mid-build. Independent indexes may be built and queried in parallel.
#[derive(Debug, Default)]
pub struct VectorIndex {
    /// Entries in insertion order.
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Embeds and appends the given chunks, one embedding call per chunk.
    ///
    /// Building into a non-empty index appends; call [`Self::clear`] first to
    /// rebuild from empty. A failed embedding call leaves the index exactly
    /// as it was before that chunk — entries are inserted only after their
    /// embedding succeeded, so an abandoned build never leaves a
    /// half-inserted entry.
    ///
    /// # Errors
    ///
    /// Returns the first embedding failure, or an error if a chunk's
    /// embedding does not match the dimensionality already in the index.
    pub async fn build<E: EmbeddingProvider>(
        &mut self,
        provider: &E,
        chunks: Vec<TextChunk>,
    ) -> Result<()> {
        for chunk in chunks {
            let embedding = provider.embed(&chunk.text).await?;
            self.insert(chunk, embedding)?;
        }
        debug!(entries = self.entries.len(), "Vector index built");
        Ok(())
    }

    /// Appends one entry, enforcing consistent dimensionality.
    fn insert(&mut self, chunk: TextChunk, embedding: Embedding) -> Result<()> {
        if embedding.is_empty() {
            return Err(Error::InvalidResponse("empty embedding vector".to_owned()));
        }
        if let Some(expected) = self.dimensions()
            && embedding.len() != expected
        {
            return Err(Error::InvalidResponse(format!(
                "chunk embedding has {} dimensions, index has {expected}",
                embedding.len()
            )));
        }
        self.entries.push(IndexEntry { chunk, embedding });
        Ok(())
    }

    /// Returns the `top_k` chunks most similar to `query_vector`, ranked by
    /// descending cosine similarity with insertion order breaking ties.
    ///
    /// Requesting more than the index holds returns everything, ranked.
    /// Querying an empty index returns an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] when `top_k` is zero or the query
    /// vector's dimensionality does not match the index.
    pub fn query(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Err(Error::InvalidQuery("top_k must be positive".to_owned()));
        }
        if self.entries.is_empty() {
            return Ok(Vec::default());
        }
        if let Some(expected) = self.dimensions()
            && query_vector.len() != expected
        {
            return Err(Error::InvalidQuery(format!(
                "query vector has {} dimensions, index has {expected}",
                query_vector.len()
            )));
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(query_vector, &entry.embedding),
            })
            .collect();

        // Stable sort keeps insertion order for equal similarities.
        scored.sort_by(|first, second| {
            second
                .similarity
                .partial_cmp(&first.similarity)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(top_k);

        Ok(scored)
    }

    /// Dimensionality of the indexed embeddings, once any entry exists.
    pub fn dimensions(&self) -> Option<usize> {
        self.entries.first().map(|entry| entry.embedding.len())
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries, allowing a rebuild from empty.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Calculate cosine similarity between two vectors.
///
/// Returns `0.0` when the vectors differ in length or either has zero
/// magnitude; callers that must distinguish the degenerate case check
/// magnitudes themselves.
pub fn cosine_similarity(vector_a: &[f32], vector_b: &[f32]) -> f32 {
    if vector_a.len() != vector_b.len() {
        return 0.0;
    }

    let dot_product: f32 = vector_a
        .iter()
        .zip(vector_b.iter())
        .map(|(component_a, component_b)| component_a * component_b)
        .sum();
    let magnitude_a = vector_a.iter().map(|component| component * component).sum::<f32>().sqrt();
    let magnitude_b = vector_b.iter().map(|component| component * component).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
