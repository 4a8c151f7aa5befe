//! Embedding generation, vector indexing, and retrieval-augmented context
//! assembly for the scholar workspace.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::float_cmp,
        reason = "Test allows"
    )
)]

/// Retrieval-augmented context assembly.
pub mod assembler;
/// Embedding provider trait and clients.
pub mod embedding;
/// In-memory vector index over text chunks.
pub mod index;

pub use assembler::{CONTEXT_SEPARATOR, ContextAssembler};
pub use embedding::{Embedding, EmbeddingProvider, MockEmbeddingClient, OpenAiEmbeddingClient};
pub use index::{ChunkId, ScoredChunk, TextChunk, VectorIndex, cosine_similarity};
