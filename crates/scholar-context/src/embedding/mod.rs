//! Embedding generation: provider trait, remote client, and test mock.

mod client;
mod mock;

pub use client::{Embedding, EmbeddingProvider, OpenAiEmbeddingClient};
pub use mock::MockEmbeddingClient;
