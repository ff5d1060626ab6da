//! Fixed-size overlapping text chunking.

/// Split text into chunks of at most `chunk_size` chars, each starting
/// `chunk_size - overlap` chars after the previous one. Boundaries are
/// snapped to char boundaries, so multi-byte text never panics.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    // A degenerate overlap would loop forever
    let step = chunk_size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("hello world", 100, 10);
        assert_eq!(chunks, vec!["hello world"]);
    }

    #[test]
    fn test_chunks_respect_max_size() {
        let text = "a".repeat(5000);
        let chunks = chunk_text(&text, 1500, 200);
        assert!(chunks.iter().all(|c| c.chars().count() <= 1500));
        assert!(chunks.len() > 1);
    }

    #[test]
    fn test_overlap_carries_shared_text() {
        let text: String = (0..100).map(|i| format!("w{i} ")).collect();
        let chunks = chunk_text(&text, 50, 20);
        // Tail of each chunk reappears at the head of the next
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().rev().take(10).collect();
            let tail: String = tail.chars().rev().collect();
            assert!(pair[1].starts_with(tail.trim_start()) || pair[1].contains(tail.trim()));
        }
    }

    #[test]
    fn test_multibyte_text_does_not_panic() {
        let text = "cà chua nướng với đậu hũ 🍅".repeat(100);
        let chunks = chunk_text(&text, 64, 16);
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_empty_and_zero_size() {
        assert!(chunk_text("", 100, 10).is_empty());
        assert!(chunk_text("text", 0, 0).is_empty());
    }

    #[test]
    fn test_full_overlap_still_terminates() {
        let chunks = chunk_text(&"x".repeat(50), 10, 10);
        assert!(chunks.len() <= 50);
    }
}
