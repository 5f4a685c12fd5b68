use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend-neutral record written to a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// A record returned by a top-k query. `score` is cosine similarity; higher is nearer.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredHit {
    pub id: String,
    pub score: f64,
    pub payload: Value,
}

impl StoredHit {
    pub fn decode<T>(&self) -> Result<T, serde_json::Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        T::deserialize(&self.payload)
    }
}
