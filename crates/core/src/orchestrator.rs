use crate::classifier::{check_topic, classify};
use crate::embeddings::EmbeddingProvider;
use crate::extractor::{summary_text, LopdfExtractor, PdfExtractor};
use crate::ingest::{discover_image_files, file_name_of, place_paper};
use crate::models::{
    AddPaper, ImageHit, ImageIndexReport, ImageMetadata, ImageRecord, LibraryOptions, PaperHit,
    PaperRecord, PaperReport,
};
use crate::traits::VectorIndex;
use crate::{IngestError, SearchError};
use chrono::Utc;
use std::path::Path;
use tracing::{debug, info, warn};

/// Image points per store write during [`Library::index_images`].
pub const IMAGE_UPSERT_BATCH: usize = 64;

/// The four library operations over injected model and store handles.
///
/// `P` holds one record per readable page, `I` one record per image file name.
pub struct Library<E, P, I, X = LopdfExtractor>
where
    E: EmbeddingProvider,
    P: VectorIndex,
    I: VectorIndex,
    X: PdfExtractor,
{
    embedder: E,
    papers: P,
    images: I,
    extractor: X,
    options: LibraryOptions,
}

impl<E, P, I> Library<E, P, I>
where
    E: EmbeddingProvider + Send + Sync,
    P: VectorIndex + Send + Sync,
    I: VectorIndex + Send + Sync,
{
    pub fn new(embedder: E, papers: P, images: I, options: LibraryOptions) -> Self {
        Self::with_extractor(embedder, papers, images, LopdfExtractor, options)
    }
}

impl<E, P, I, X> Library<E, P, I, X>
where
    E: EmbeddingProvider + Send + Sync,
    P: VectorIndex + Send + Sync,
    I: VectorIndex + Send + Sync,
    X: PdfExtractor + Send + Sync,
{
    pub fn with_extractor(
        embedder: E,
        papers: P,
        images: I,
        extractor: X,
        options: LibraryOptions,
    ) -> Self {
        Self {
            embedder,
            papers,
            images,
            extractor,
            options,
        }
    }

    pub fn papers(&self) -> &P {
        &self.papers
    }

    pub fn images(&self) -> &I {
        &self.images
    }

    /// Classifies a PDF, files it under `data/<topic>/`, and indexes every readable page.
    ///
    /// The file is placed before the index is written; a store failure leaves the
    /// file in its new location without index entries.
    pub async fn add_paper(&self, request: AddPaper) -> Result<PaperReport, IngestError> {
        let source = request.source.as_path();
        for topic in &request.topics {
            check_topic(topic)?;
        }
        if !source.is_file() {
            return Err(IngestError::NotFound(source.to_path_buf()));
        }
        let file_name = match request.file_name {
            Some(name) => name,
            None => file_name_of(source)?,
        };

        info!(path = %source.display(), "processing paper");
        let chunks = self.extractor.extract_pages(source);
        if chunks.is_empty() {
            return Err(IngestError::NoReadableText(source.to_path_buf()));
        }

        let topic = classify(&self.embedder, &summary_text(&chunks), &request.topics)?;
        info!(file = %file_name, topic = %topic, "detected topic");

        let stored_path = place_paper(
            source,
            &self.options.data_root,
            &topic,
            &file_name,
            request.placement,
        )?;

        let mut points = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let embedding = self.embedder.embed_text(&chunk.text)?;
            points.push(
                PaperRecord::from_chunk(&file_name, &stored_path, &topic, chunk, embedding)
                    .into_point(),
            );
        }

        info!(file = %file_name, pages = points.len(), "indexing pages");
        self.papers.upsert(&points).await?;

        Ok(PaperReport {
            file_name,
            topic,
            stored_path,
            pages_indexed: points.len(),
            ingested_at: Utc::now(),
        })
    }

    pub async fn search_papers(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<PaperHit>, SearchError> {
        if query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed_text(query)?;
        let hits = self.papers.query(&vector, top_k).await?;
        debug!(query, hits = hits.len(), "paper search");
        Ok(hits.into_iter().map(PaperHit::from).collect())
    }

    /// Indexes every image below `root`. Files that fail to decode or embed are
    /// skipped and only counted; the embeddings are then written in batches of
    /// [`IMAGE_UPSERT_BATCH`], and a failed write aborts the run.
    pub async fn index_images(&self, root: &Path) -> Result<ImageIndexReport, IngestError> {
        if !root.is_dir() {
            return Err(IngestError::NotFound(root.to_path_buf()));
        }

        let mut report = ImageIndexReport::default();
        let mut pending = Vec::with_capacity(IMAGE_UPSERT_BATCH);
        for path in discover_image_files(root) {
            match self.embed_image_record(&path) {
                Ok(record) => {
                    debug!(key = %record.key, "embedded image");
                    pending.push(record.into_point());
                }
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "skipped image");
                    report.skipped += 1;
                }
            }

            if pending.len() == IMAGE_UPSERT_BATCH {
                self.images.upsert(&pending).await?;
                report.indexed += pending.len();
                pending.clear();
            }
        }
        if !pending.is_empty() {
            self.images.upsert(&pending).await?;
            report.indexed += pending.len();
        }

        info!(
            root = %root.display(),
            indexed = report.indexed,
            skipped = report.skipped,
            "image indexing finished"
        );
        Ok(report)
    }

    fn embed_image_record(&self, path: &Path) -> Result<ImageRecord, IngestError> {
        let key = file_name_of(path)?;
        let embedding = self.embedder.embed_image(path)?;
        Ok(ImageRecord {
            key,
            embedding,
            metadata: ImageMetadata {
                path: path.to_string_lossy().to_string(),
            },
        })
    }

    pub async fn search_images(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ImageHit>, SearchError> {
        if query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed_text_for_image(query)?;
        let hits = self.images.query(&vector, top_k).await?;
        debug!(query, hits = hits.len(), "image search");
        Ok(hits.into_iter().map(ImageHit::from).collect())
    }
}
