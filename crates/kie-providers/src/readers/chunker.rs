//! The default fixed-size sliding-window text splitter, applied to document text after
//! trimming. Boundaries fall on grapheme clusters so multi-byte characters are never
//! split mid-codepoint.

use unicode_segmentation::UnicodeSegmentation;

/// Split `text` into overlapping windows of `chunk_size` graphemes, striding by
/// `chunk_size - effective_overlap` (minimum 1). Empty chunks (after trimming) are
/// dropped. Mirrors [`kie_domain::entities::KnowledgeBase::effective_overlap`] and
/// [`kie_domain::entities::KnowledgeBase::stride`], which this function can't call
/// directly since callers here only have the two plain sizes, not a whole base.
#[must_use]
pub fn split_fixed(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let graphemes: Vec<&str> = trimmed.graphemes(true).collect();
    if graphemes.is_empty() {
        return Vec::new();
    }

    let effective_overlap = chunk_overlap.min(chunk_size - 1);
    let stride = chunk_size.saturating_sub(effective_overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < graphemes.len() {
        let end = (start + chunk_size).min(graphemes.len());
        let chunk: String = graphemes[start..end].concat();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_owned());
        }
        if end == graphemes.len() {
            break;
        }
        start += stride;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_overlapping_windows() {
        let text = "a".repeat(25);
        let chunks = split_fixed(&text, 10, 2);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].len(), 10);
    }

    #[test]
    fn overlap_ge_chunk_size_clamps_and_still_advances() {
        let text = "a".repeat(20);
        let chunks = split_fixed(&text, 5, 5);
        assert!(chunks.len() > 1);
    }

    #[test]
    fn empty_text_produces_no_chunks() {
        assert!(split_fixed("   ", 10, 2).is_empty());
    }

    #[test]
    fn trailing_whitespace_chunk_is_dropped() {
        let chunks = split_fixed("hello   ", 5, 0);
        assert_eq!(chunks, vec!["hello".to_owned()]);
    }
}
