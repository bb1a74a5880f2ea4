//! Word-boundary chunking for document text

/// Minimum effective window size in words
const MIN_CHUNK_SIZE: usize = 64;

/// Splits text into overlapping word windows sized for embedding
#[derive(Debug, Clone)]
pub struct ContentChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl ContentChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Window size after normalization
    pub fn effective_size(&self) -> usize {
        self.chunk_size.max(MIN_CHUNK_SIZE)
    }

    /// Overlap after clamping to half the window.
    /// Keeping overlap <= size/2 guarantees every step advances the window.
    pub fn effective_overlap(&self) -> usize {
        self.chunk_overlap.min(self.effective_size() / 2)
    }

    /// Split text into overlapping chunks joined on single spaces.
    ///
    /// Every input word lands in at least one chunk; re-running on the same
    /// input yields an identical sequence.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let size = self.effective_size();
        let overlap = self.effective_overlap();

        let mut chunks = Vec::new();
        let mut start = 0;
        let total_words = words.len();

        while start < total_words {
            let end = (start + size).min(total_words);
            let chunk_text = words[start..end].join(" ");
            let chunk_text = chunk_text.trim();
            if !chunk_text.is_empty() {
                chunks.push(chunk_text.to_string());
            }
            if end == total_words {
                break;
            }
            start = end.saturating_sub(overlap);
        }

        chunks
    }
}

/// Approximate token count used for chunk bookkeeping
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words_of(chunk: &str) -> Vec<&str> {
        chunk.split_whitespace().collect()
    }

    #[test]
    fn test_empty_text() {
        let chunker = ContentChunker::new(512, 128);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t ").is_empty());
    }

    #[test]
    fn test_single_word() {
        let chunker = ContentChunker::new(512, 128);
        let chunks = chunker.chunk("hello");
        assert_eq!(chunks, vec!["hello".to_string()]);
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = ContentChunker::new(512, 128);
        let chunks = chunker.chunk("the quick brown fox");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "the quick brown fox");
    }

    #[test]
    fn test_small_size_normalized_to_minimum() {
        // Requested size below 64 is raised to 64, so 14 words fit one chunk
        let chunker = ContentChunker::new(10, 2);
        assert_eq!(chunker.effective_size(), 64);
        let text = "the quick brown fox jumps over the lazy dog and then some more words here";
        assert_eq!(chunker.chunk(text).len(), 1);
    }

    #[test]
    fn test_window_advance_with_overlap() {
        let chunker = ContentChunker::new(64, 4);
        let words: Vec<String> = (0..100).map(|i| format!("w{i}")).collect();
        let text = words.join(" ");

        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 2);
        // Second window starts at 64 - 4 = 60
        assert!(chunks[0].starts_with("w0 "));
        assert!(chunks[1].starts_with("w60 "));
        assert!(chunks[1].ends_with(" w99"));

        // Adjacent full-width chunks share exactly `overlap` words
        let first = words_of(&chunks[0]);
        let second = words_of(&chunks[1]);
        assert_eq!(&first[first.len() - 4..], &second[..4]);
    }

    #[test]
    fn test_overlap_clamped_to_half_size() {
        let chunker = ContentChunker::new(64, 200);
        assert_eq!(chunker.effective_overlap(), 32);

        // Oversized overlap still terminates and covers all words
        let words: Vec<String> = (0..150).map(|i| format!("w{i}")).collect();
        let chunks = chunker.chunk(&words.join(" "));
        assert!(!chunks.is_empty());
        let last = chunks.last().unwrap();
        assert!(last.ends_with(" w149"));
    }

    #[test]
    fn test_deterministic() {
        let chunker = ContentChunker::new(64, 16);
        let words: Vec<String> = (0..300).map(|i| format!("word{i}")).collect();
        let text = words.join(" ");
        assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("one two three"), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  spaced \n out  "), 2);
    }

    proptest! {
        #[test]
        fn prop_every_word_is_covered(
            word_total in 1usize..400,
            chunk_size in 1usize..512,
            overlap in 0usize..512,
        ) {
            let words: Vec<String> = (0..word_total).map(|i| format!("t{i}")).collect();
            let text = words.join(" ");
            let chunker = ContentChunker::new(chunk_size, overlap);
            let chunks = chunker.chunk(&text);

            let mut seen = std::collections::HashSet::new();
            for chunk in &chunks {
                for word in chunk.split_whitespace() {
                    seen.insert(word.to_string());
                }
            }
            for word in &words {
                prop_assert!(seen.contains(word));
            }
        }
    }
}
