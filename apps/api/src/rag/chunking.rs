//! Text chunking for ingestion. Two splitters: a sliding window with
//! sentence-boundary backscan, and paragraph packing for structured docs.

/// Splits text into overlapping chunks of roughly `chunk_size` characters.
/// Prefers to break at a sentence ending within the last 100 characters of
/// a chunk. Whitespace runs are collapsed first.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let normalized: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() <= chunk_size {
        return vec![normalized];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let mut end = (start + chunk_size).min(chars.len());

        if end < chars.len() {
            let search_start = end.saturating_sub(100).max(start);
            if let Some(boundary) = (search_start..end)
                .rev()
                .find(|&i| matches!(chars[i], '.' | '!' | '?'))
            {
                if boundary > start {
                    end = boundary + 1;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim().to_string();
        if !chunk.is_empty() {
            chunks.push(chunk);
        }

        if end >= chars.len() {
            break;
        }
        // Overlap must never stall the walk.
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    chunks
}

/// Chunks text by blank-line-separated paragraphs, packing small paragraphs
/// together up to `max_chunk_size` characters. Oversized paragraphs are
/// split with `chunk_text`.
pub fn chunk_by_paragraphs(text: &str, max_chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0usize;

    for para in split_paragraphs(text) {
        let para_size = para.chars().count();

        if para_size > max_chunk_size {
            if !current.is_empty() {
                chunks.push(current.join("\n\n"));
                current.clear();
                current_size = 0;
            }
            chunks.extend(chunk_text(para, max_chunk_size, 50));
        } else if current_size + para_size + 2 <= max_chunk_size {
            current.push(para);
            current_size += para_size + 2;
        } else {
            if !current.is_empty() {
                chunks.push(current.join("\n\n"));
            }
            current = vec![para];
            current_size = para_size;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join("\n\n"));
    }

    chunks
}

/// Splits on blank lines (a newline, optional whitespace, another newline).
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut rest = text;

    while let Some(split_at) = find_blank_line(rest) {
        let (head, tail) = rest.split_at(split_at.0);
        let trimmed = head.trim();
        if !trimmed.is_empty() {
            paragraphs.push(trimmed);
        }
        rest = &tail[split_at.1..];
    }

    let trimmed = rest.trim();
    if !trimmed.is_empty() {
        paragraphs.push(trimmed);
    }

    paragraphs
}

/// Finds the first blank-line separator, returning (start offset, length).
fn find_blank_line(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\n' {
            let mut j = i + 1;
            while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t' || bytes[j] == b'\r') {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'\n' {
                return Some((i, j + 1 - i));
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", 500, 100).is_empty());
        assert!(chunk_by_paragraphs("", 800).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("A short sentence.", 500, 100);
        assert_eq!(chunks, vec!["A short sentence.".to_string()]);
    }

    #[test]
    fn test_chunks_respect_size_bound() {
        let text = "word ".repeat(500);
        let chunks = chunk_text(&text, 200, 20);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 200, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = "alpha beta gamma. ".repeat(60);
        let chunks = chunk_text(&text, 150, 30);
        assert!(chunks.len() > 1);
        // The tail of chunk N reappears at the head of chunk N+1.
        let tail: String = chunks[0].chars().rev().take(10).collect::<String>();
        let tail: String = tail.chars().rev().collect();
        assert!(chunks[1].contains(tail.trim()));
    }

    #[test]
    fn test_paragraphs_pack_small_ones() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunk_by_paragraphs(text, 800);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("First paragraph."));
        assert!(chunks[0].contains("Third paragraph."));
    }

    #[test]
    fn test_paragraphs_split_when_full() {
        let a = "a".repeat(500);
        let b = "b".repeat(500);
        let text = format!("{a}\n\n{b}");
        let chunks = chunk_by_paragraphs(&text, 600);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_oversized_paragraph_is_split() {
        let text = "x".repeat(2000);
        let chunks = chunk_by_paragraphs(&text, 800);
        assert!(chunks.len() >= 2);
    }
}
