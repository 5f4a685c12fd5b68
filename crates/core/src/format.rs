use crate::models::{ImageHit, PaperHit};
use std::fmt::Write;
use std::path::Path;

pub const SNIPPET_CHARS: usize = 300;

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses whitespace and keeps at most `max_chars` characters.
pub fn snippet(text: &str, max_chars: usize) -> String {
    normalize_whitespace(text).chars().take(max_chars).collect()
}

pub fn render_paper_hits(query: &str, hits: &[PaperHit]) -> String {
    let rule = "=".repeat(50);
    let divider = "-".repeat(30);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, " Search Results for: '{query}'");
    let _ = writeln!(out, "{rule}");

    if hits.is_empty() {
        out.push_str("No results found.\n");
        return out;
    }

    for (index, hit) in hits.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Result {} (score={:.4})", index + 1, hit.score);
        let _ = writeln!(out, "  File: {}", hit.file_name());
        let _ = writeln!(out, "  Page: {}", hit.page);
        let _ = writeln!(out, "  Topic: {}", hit.topic);
        let _ = writeln!(out, "{divider}");
        let _ = writeln!(out, "Snippet: \"...{}...\"", snippet(&hit.text, SNIPPET_CHARS));
        let _ = writeln!(out, "{divider}");
    }

    out
}

/// Lists image hits; hits whose file is gone from disk are flagged.
pub fn render_image_hits(hits: &[ImageHit]) -> String {
    let mut out = String::from("--- Image Results ---\n");

    if hits.is_empty() {
        out.push_str("No images found.\n");
        return out;
    }

    for (index, hit) in hits.iter().enumerate() {
        let _ = write!(out, "[{}] {} (Path: {})", index + 1, hit.key, hit.path);
        if !Path::new(&hit.path).is_file() {
            out.push_str(" [image missing]");
        }
        out.push('\n');
    }

    out
}
