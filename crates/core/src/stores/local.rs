//! On-disk vector store for single-user libraries.
//!
//! Each collection is one JSON file below the store root, loaded into memory
//! when opened and rewritten after every upsert. A failed write leaves the
//! in-memory view unchanged. Queries are exhaustive cosine scans, which is
//! plenty for a personal paper and image collection.

use crate::embeddings::cosine_similarity;
use crate::store::{StoredHit, VectorPoint};
use crate::traits::VectorIndex;
use crate::SearchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, SearchError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens the named collection, creating it on first use.
    pub async fn collection(
        &self,
        name: &str,
        dimensions: usize,
    ) -> Result<LocalCollection, SearchError> {
        if name.is_empty() || name.contains(['/', '\\', '.']) {
            return Err(SearchError::Request(format!(
                "invalid collection name: {name:?}"
            )));
        }

        let path = self.root.join(format!("{name}.json"));
        let file = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<CollectionFile>(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let file = CollectionFile {
                    dimensions,
                    points: BTreeMap::new(),
                };
                write_atomically(&path, &file).await?;
                debug!(collection = name, dimensions, "created collection");
                file
            }
            Err(err) => return Err(err.into()),
        };

        if file.dimensions != dimensions {
            return Err(SearchError::Request(format!(
                "collection {name} holds {}-dimensional vectors, requested {dimensions}",
                file.dimensions
            )));
        }

        Ok(LocalCollection {
            name: name.to_string(),
            path,
            dimensions,
            points: RwLock::new(file.points),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    dimensions: usize,
    points: BTreeMap<String, StoredPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPoint {
    vector: Vec<f32>,
    payload: Value,
}

pub struct LocalCollection {
    name: String,
    path: PathBuf,
    dimensions: usize,
    points: RwLock<BTreeMap<String, StoredPoint>>,
}

impl LocalCollection {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn check_dimensions(&self, len: usize) -> Result<(), SearchError> {
        if len != self.dimensions {
            return Err(SearchError::Request(format!(
                "vector dim {len} is not {} for collection {}",
                self.dimensions, self.name
            )));
        }
        Ok(())
    }
}

async fn write_atomically(path: &Path, file: &CollectionFile) -> Result<(), SearchError> {
    let bytes = serde_json::to_vec(file)?;
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, bytes).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}

#[async_trait]
impl VectorIndex for LocalCollection {
    async fn upsert(&self, points: &[VectorPoint]) -> Result<(), SearchError> {
        for point in points {
            self.check_dimensions(point.vector.len())?;
        }
        if points.is_empty() {
            return Ok(());
        }

        let mut stored = self.points.write().await;
        let mut file = CollectionFile {
            dimensions: self.dimensions,
            points: stored.clone(),
        };
        for point in points {
            file.points.insert(
                point.id.clone(),
                StoredPoint {
                    vector: point.vector.clone(),
                    payload: point.payload.clone(),
                },
            );
        }

        // memory only changes once the file is on disk
        write_atomically(&self.path, &file).await?;
        *stored = file.points;
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<StoredHit>, SearchError> {
        self.check_dimensions(vector.len())?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let stored = self.points.read().await;
        let mut hits = stored
            .iter()
            .map(|(id, point)| StoredHit {
                id: id.clone(),
                score: f64::from(cosine_similarity(&point.vector, vector)),
                payload: point.payload.clone(),
            })
            .collect::<Vec<_>>();

        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self) -> Result<usize, SearchError> {
        Ok(self.points.read().await.len())
    }
}
