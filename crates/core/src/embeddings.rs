use crate::error::EmbeddingError;
use image::imageops::FilterType;
use std::path::Path;

const DEFAULT: usize = 128;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;

/// Source of the two embedding spaces the library works with.
///
/// `embed_text` lives in the plain text space and is used for pages, summaries,
/// and topic labels. `embed_image` and `embed_text_for_image` share a joint
/// text/image space. Vectors from the two spaces are never compared.
pub trait EmbeddingProvider {
    fn text_dimensions(&self) -> usize;

    fn joint_dimensions(&self) -> usize;

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn embed_image(&self, path: &Path) -> Result<Vec<f32>, EmbeddingError>;

    fn embed_text_for_image(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed_text(text)).collect()
    }
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<T> {
    fn text_dimensions(&self) -> usize {
        (**self).text_dimensions()
    }

    fn joint_dimensions(&self) -> usize {
        (**self).joint_dimensions()
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed_text(text)
    }

    fn embed_image(&self, path: &Path) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed_image(path)
    }

    fn embed_text_for_image(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed_text_for_image(text)
    }

    fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed_texts(texts)
    }
}

/// Deterministic, model-free provider. Text is hashed into character trigram
/// buckets, images are reduced to a grayscale thumbnail. Useful offline and in
/// tests; the scores carry lexical rather than semantic meaning.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    pub dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl HashingEmbedder {
    fn trigram_vector(&self, text: &str, seed: u64) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = seed;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        normalize(&mut vector);
        vector
    }
}

// Distinct FNV offsets keep the text and joint spaces from coinciding.
const TEXT_SEED: u64 = 1469598103934665603;
const JOINT_SEED: u64 = 1469598103934665603 ^ 0x9e37_79b9_7f4a_7c15;

impl EmbeddingProvider for HashingEmbedder {
    fn text_dimensions(&self) -> usize {
        self.dimensions.max(1)
    }

    fn joint_dimensions(&self) -> usize {
        self.dimensions.max(1)
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.trigram_vector(text, TEXT_SEED))
    }

    fn embed_image(&self, path: &Path) -> Result<Vec<f32>, EmbeddingError> {
        let image = image::open(path)?;
        let side = (self.joint_dimensions() as f64).sqrt().ceil() as u32;
        let thumbnail = image
            .resize_exact(side, side, FilterType::Triangle)
            .to_luma8();

        let mut vector = thumbnail
            .as_raw()
            .iter()
            .take(self.joint_dimensions())
            .map(|value| f32::from(*value) / 255.0)
            .collect::<Vec<_>>();
        vector.resize(self.joint_dimensions(), 0.0);

        normalize(&mut vector);
        Ok(vector)
    }

    fn embed_text_for_image(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.trigram_vector(text, JOINT_SEED))
    }
}

pub fn normalize(vector: &mut [f32]) {
    let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in vector.iter_mut() {
            *value /= magnitude;
        }
    }
}

/// Cosine similarity; 0.0 when either side has zero magnitude.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();
    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    dot / (left_norm * right_norm)
}

#[cfg(test)]
mod tests {
    use super::{cosine_similarity, EmbeddingProvider, HashingEmbedder};
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn embedder_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
        let embedder = HashingEmbedder::default();
        let first = embedder.embed_text("Attention is all you need")?;
        let second = embedder.embed_text("Attention is all you need")?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn embedder_outputs_expected_length() -> Result<(), Box<dyn std::error::Error>> {
        let embedder = HashingEmbedder { dimensions: 32 };
        assert_eq!(embedder.embed_text("abc")?.len(), 32);
        assert_eq!(embedder.embed_text_for_image("abc")?.len(), 32);
        Ok(())
    }

    #[test]
    fn text_and_joint_spaces_differ() -> Result<(), Box<dyn std::error::Error>> {
        let embedder = HashingEmbedder::default();
        let text = embedder.embed_text("a diagram of a transformer")?;
        let joint = embedder.embed_text_for_image("a diagram of a transformer")?;
        assert_ne!(text, joint);
        Ok(())
    }

    #[test]
    fn image_embedding_is_normalized() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("gradient.png");
        RgbImage::from_fn(40, 20, |x, y| Rgb([(x * 6) as u8, (y * 12) as u8, 90])).save(&path)?;

        let embedder = HashingEmbedder::default();
        let vector = embedder.embed_image(&path)?;
        assert_eq!(vector.len(), embedder.joint_dimensions());

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn corrupt_image_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg")?;

        assert!(HashingEmbedder::default().embed_image(&path).is_err());
        Ok(())
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[5.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
