use lopdf::Document;
use std::path::Path;
use tracing::{error, warn};

/// Pages whose trimmed text is shorter than this are treated as blank or scanned.
pub const MIN_PAGE_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageChunk {
    pub text: String,
    pub page: u32,
}

pub trait PdfExtractor {
    /// Returns one chunk per readable page. Never fails: a document that cannot
    /// be opened yields an empty list.
    fn extract_pages(&self, path: &Path) -> Vec<PageChunk>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Vec<PageChunk> {
        let document = match Document::load(path) {
            Ok(document) => document,
            Err(err) => {
                error!(path = %path.display(), error = %err, "unable to read pdf");
                return Vec::new();
            }
        };

        let mut chunks = Vec::new();
        for page_no in document.get_pages().into_keys() {
            let text = match document.extract_text(&[page_no]) {
                Ok(text) => text,
                Err(err) => {
                    warn!(path = %path.display(), page = page_no, error = %err, "skipping undecodable page");
                    continue;
                }
            };

            if let Some(chunk) = page_chunk(page_no, &text) {
                chunks.push(chunk);
            }
        }

        chunks
    }
}

pub fn extract_page_chunks(path: &Path) -> Vec<PageChunk> {
    LopdfExtractor.extract_pages(path)
}

fn page_chunk(page: u32, raw: &str) -> Option<PageChunk> {
    let text = raw.trim();
    if text.chars().count() < MIN_PAGE_CHARS {
        return None;
    }

    Some(PageChunk {
        text: text.to_string(),
        page,
    })
}

/// Joins the first three page texts; used as the document's classification input.
pub fn summary_text(chunks: &[PageChunk]) -> String {
    chunks
        .iter()
        .take(3)
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
