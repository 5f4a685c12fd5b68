use crate::store::{StoredHit, VectorPoint};
use crate::SearchError;
use async_trait::async_trait;

/// Handle to a single named collection in a vector store.
#[async_trait]
pub trait VectorIndex {
    /// Inserts or overwrites points by id.
    async fn upsert(&self, points: &[VectorPoint]) -> Result<(), SearchError>;

    /// Returns at most `top_k` hits, nearest first.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<StoredHit>, SearchError>;

    async fn count(&self) -> Result<usize, SearchError>;
}
