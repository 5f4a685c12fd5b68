use crate::extractor::PageChunk;
use crate::store::{StoredHit, VectorPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};

pub const PAPERS_COLLECTION: &str = "papers";
pub const IMAGES_COLLECTION: &str = "images";

/// Payload stored next to every page vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperMetadata {
    pub path: String,
    pub topic: String,
    pub page: u32,
    pub document: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageMetadata {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaperRecord {
    pub key: String,
    pub embedding: Vec<f32>,
    pub metadata: PaperMetadata,
}

impl PaperRecord {
    pub fn key_for(file_name: &str, page: u32) -> String {
        format!("{file_name}_p{page}")
    }

    pub fn from_chunk(
        file_name: &str,
        stored_path: &Path,
        topic: &str,
        chunk: &PageChunk,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            key: Self::key_for(file_name, chunk.page),
            embedding,
            metadata: PaperMetadata {
                path: stored_path.to_string_lossy().to_string(),
                topic: topic.to_string(),
                page: chunk.page,
                document: chunk.text.clone(),
            },
        }
    }

    pub fn into_point(self) -> VectorPoint {
        VectorPoint {
            id: self.key,
            vector: self.embedding,
            payload: json!(self.metadata),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub key: String,
    pub embedding: Vec<f32>,
    pub metadata: ImageMetadata,
}

impl ImageRecord {
    pub fn into_point(self) -> VectorPoint {
        VectorPoint {
            id: self.key,
            vector: self.embedding,
            payload: json!(self.metadata),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperHit {
    pub key: String,
    pub score: f64,
    pub path: String,
    pub topic: String,
    pub page: u32,
    pub text: String,
}

impl PaperHit {
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.path)
    }
}

impl From<StoredHit> for PaperHit {
    fn from(hit: StoredHit) -> Self {
        let metadata = hit.decode::<PaperMetadata>().unwrap_or_default();
        Self {
            key: hit.id,
            score: hit.score,
            path: metadata.path,
            topic: metadata.topic,
            page: metadata.page,
            text: metadata.document,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageHit {
    pub key: String,
    pub score: f64,
    pub path: String,
}

impl From<StoredHit> for ImageHit {
    fn from(hit: StoredHit) -> Self {
        let metadata = hit.decode::<ImageMetadata>().unwrap_or_default();
        Self {
            key: hit.id,
            score: hit.score,
            path: metadata.path,
        }
    }
}

/// How a paper reaches `data/<topic>/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Rename the source into place (command line default).
    #[default]
    Move,
    /// Leave the source untouched, e.g. an upload in a temp directory.
    Copy,
}

#[derive(Debug, Clone)]
pub struct AddPaper {
    pub source: PathBuf,
    /// Name to file the paper under; defaults to the source's file name.
    pub file_name: Option<String>,
    pub topics: Vec<String>,
    pub placement: Placement,
}

impl AddPaper {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            file_name: None,
            topics: Vec::new(),
            placement: Placement::default(),
        }
    }

    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaperReport {
    pub file_name: String,
    pub topic: String,
    pub stored_path: PathBuf,
    pub pages_indexed: usize,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImageIndexReport {
    pub indexed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct LibraryOptions {
    pub data_root: PathBuf,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
        }
    }
}
