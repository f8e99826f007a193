//! Overlapping character windows over document text

/// Split `text` into windows of at most `target` characters, each starting
/// `overlap` characters before the previous one ended. Boundaries are
/// measured in chars, never splitting a UTF-8 sequence.
pub fn chunk_text(text: &str, target: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || target == 0 {
        return Vec::new();
    }

    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + target).min(char_count);
        chunks.push(text[bounds[start]..bounds[end]].to_string());
        if end == char_count {
            break;
        }
        // Always advance, even with an overlap as large as the window
        start = end.saturating_sub(overlap).max(start + 1);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 1800, 200).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(chunk_text("Rust uses LLVM.", 1800, 200), vec!["Rust uses LLVM."]);
    }

    #[test]
    fn test_windows_overlap() {
        let text: String = ('a'..='z').collect();
        let chunks = chunk_text(&text, 10, 3);
        assert_eq!(chunks, vec!["abcdefghij", "hijklmnopq", "opqrstuvwx", "vwxyz"]);
    }

    #[test]
    fn test_default_sizes() {
        let text = "x".repeat(4000);
        let chunks = chunk_text(&text, 1800, 200);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1800);
        assert_eq!(chunks[1].len(), 1800);
        assert_eq!(chunks[2].len(), 4000 - 3200);
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "ééééé";
        let chunks = chunk_text(text, 2, 1);
        assert_eq!(chunks, vec!["éé", "éé", "éé", "éé"]);
    }

    #[test]
    fn test_degenerate_overlap_terminates() {
        let chunks = chunk_text("abcd", 2, 5);
        assert_eq!(chunks, vec!["ab", "bc", "cd"]);
    }
}
