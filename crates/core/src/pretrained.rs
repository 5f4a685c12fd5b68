//! Pretrained encoders backed by `fastembed` (ONNX runtime).
//!
//! Two model directories are expected below the models root:
//! `all-MiniLM-L6-v2` for the text space and `clip-ViT-B-32` for the joint
//! text/image space. They are used as the runtime's model cache, so a directory
//! populated once can be used offline afterwards.

use crate::embeddings::EmbeddingProvider;
use crate::error::EmbeddingError;
use fastembed::{
    EmbeddingModel, ImageEmbedding, ImageEmbeddingModel, ImageInitOptions, InitOptions,
    TextEmbedding,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

pub const TEXT_MODEL_DIR: &str = "all-MiniLM-L6-v2";
pub const CLIP_MODEL_DIR: &str = "clip-ViT-B-32";

const TEXT_DIMENSIONS: usize = 384;
const CLIP_DIMENSIONS: usize = 512;

pub struct FastEmbedProvider {
    text_model: Mutex<TextEmbedding>,
    clip_text_model: Mutex<TextEmbedding>,
    clip_vision_model: Mutex<ImageEmbedding>,
}

impl FastEmbedProvider {
    /// Loads both encoders. Fails when either model directory is missing.
    pub fn load(models_root: &Path) -> Result<Self, EmbeddingError> {
        let text_dir = require_dir(models_root.join(TEXT_MODEL_DIR))?;
        let clip_dir = require_dir(models_root.join(CLIP_MODEL_DIR))?;

        info!(path = %text_dir.display(), "loading text model");
        let text_model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                .with_cache_dir(text_dir)
                .with_show_download_progress(false),
        )
        .map_err(|err| EmbeddingError::Init(err.to_string()))?;

        info!(path = %clip_dir.display(), "loading clip model");
        let clip_text_model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::ClipVitB32)
                .with_cache_dir(clip_dir.clone())
                .with_show_download_progress(false),
        )
        .map_err(|err| EmbeddingError::Init(err.to_string()))?;
        let clip_vision_model = ImageEmbedding::try_new(
            ImageInitOptions::new(ImageEmbeddingModel::ClipVitB32)
                .with_cache_dir(clip_dir)
                .with_show_download_progress(false),
        )
        .map_err(|err| EmbeddingError::Init(err.to_string()))?;

        Ok(Self {
            text_model: Mutex::new(text_model),
            clip_text_model: Mutex::new(clip_text_model),
            clip_vision_model: Mutex::new(clip_vision_model),
        })
    }
}

fn require_dir(path: PathBuf) -> Result<PathBuf, EmbeddingError> {
    if path.is_dir() {
        Ok(path)
    } else {
        Err(EmbeddingError::ModelAssetsMissing(path))
    }
}

fn embed_one(model: &Mutex<TextEmbedding>, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let guard = model
        .lock()
        .map_err(|_| EmbeddingError::Inference("text model lock poisoned".to_string()))?;
    guard
        .embed(vec![text], None)
        .map_err(|err| EmbeddingError::Inference(err.to_string()))?
        .into_iter()
        .next()
        .ok_or_else(|| EmbeddingError::Empty(text.chars().take(40).collect()))
}

impl EmbeddingProvider for FastEmbedProvider {
    fn text_dimensions(&self) -> usize {
        TEXT_DIMENSIONS
    }

    fn joint_dimensions(&self) -> usize {
        CLIP_DIMENSIONS
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        embed_one(&self.text_model, text)
    }

    fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let guard = self
            .text_model
            .lock()
            .map_err(|_| EmbeddingError::Inference("text model lock poisoned".to_string()))?;
        guard
            .embed(texts.to_vec(), None)
            .map_err(|err| EmbeddingError::Inference(err.to_string()))
    }

    fn embed_image(&self, path: &Path) -> Result<Vec<f32>, EmbeddingError> {
        // Decode up front so unreadable files surface as image errors.
        image::open(path)?;

        let guard = self
            .clip_vision_model
            .lock()
            .map_err(|_| EmbeddingError::Inference("vision model lock poisoned".to_string()))?;
        guard
            .embed(vec![path], None)
            .map_err(|err| EmbeddingError::Inference(err.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Empty(path.display().to_string()))
    }

    fn embed_text_for_image(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        embed_one(&self.clip_text_model, text)
    }
}
