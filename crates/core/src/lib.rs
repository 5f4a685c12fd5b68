pub mod classifier;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod format;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod pretrained;
pub mod store;
pub mod stores;
pub mod traits;

pub use classifier::{check_topic, classify, parse_topics, UNCATEGORIZED};
pub use embeddings::{
    cosine_similarity, EmbeddingProvider, HashingEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{EmbeddingError, IngestError, SearchError};
pub use extractor::{extract_page_chunks, LopdfExtractor, PageChunk, PdfExtractor, MIN_PAGE_CHARS};
pub use format::{render_image_hits, render_paper_hits};
pub use ingest::{discover_image_files, place_paper, IMAGE_EXTENSIONS};
pub use models::{
    AddPaper, ImageHit, ImageIndexReport, LibraryOptions, PaperHit, PaperRecord, PaperReport,
    Placement, IMAGES_COLLECTION, PAPERS_COLLECTION,
};
pub use orchestrator::{Library, IMAGE_UPSERT_BATCH};
pub use pretrained::FastEmbedProvider;
pub use store::{StoredHit, VectorPoint};
pub use stores::{LocalCollection, LocalStore, QdrantStore};
pub use traits::VectorIndex;
