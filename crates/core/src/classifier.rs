use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::error::{EmbeddingError, IngestError};

/// Label assigned when no candidate topics are supplied.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Parses a comma separated topic list. Entries are trimmed and blanks dropped.
/// Labels become directory names, so path-like entries are rejected.
pub fn parse_topics(raw: &str) -> Result<Vec<String>, IngestError> {
    let mut topics = Vec::new();
    for entry in raw.split(',') {
        let topic = entry.trim();
        if topic.is_empty() {
            continue;
        }
        check_topic(topic)?;
        topics.push(topic.to_string());
    }
    Ok(topics)
}

/// Rejects labels that cannot serve as a single directory name.
pub fn check_topic(topic: &str) -> Result<(), IngestError> {
    if topic.trim().is_empty()
        || topic == "."
        || topic == ".."
        || topic.contains(['/', '\\'])
    {
        return Err(IngestError::InvalidArgument(format!(
            "topic cannot be used as a directory name: {topic:?}"
        )));
    }
    Ok(())
}

/// Picks the topic whose embedding is closest to the summary. Ties go to the
/// earliest label.
pub fn classify<E: EmbeddingProvider + ?Sized>(
    embedder: &E,
    summary: &str,
    topics: &[String],
) -> Result<String, EmbeddingError> {
    if topics.is_empty() {
        return Ok(UNCATEGORIZED.to_string());
    }

    let summary_vector = embedder.embed_text(summary)?;
    let labels = topics.iter().map(String::as_str).collect::<Vec<_>>();
    let label_vectors = embedder.embed_texts(&labels)?;

    let best = best_match(&summary_vector, &label_vectors).unwrap_or(0);
    Ok(topics[best].clone())
}

fn best_match(target: &[f32], candidates: &[Vec<f32>]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let score = cosine_similarity(target, candidate);
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score > top => best = Some((index, score)),
            None => best = Some((index, score)),
            _ => {}
        }
    }
    best.map(|(index, _)| index)
}
