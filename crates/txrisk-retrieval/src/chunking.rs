//! Splitting the guidance corpus into indexable passages

use serde::{Deserialize, Serialize};

/// How the guidance corpus is cut into passages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Blank-line separated paragraphs, merged up to the size limit
    #[default]
    ByParagraph,
    /// Markdown headers (`# Title`) start a new passage
    BySection,
}

/// Chunks text according to the specified strategy
#[derive(Debug, Clone)]
pub struct TextChunker {
    strategy: ChunkStrategy,
    max_chunk_chars: usize,
}

impl TextChunker {
    /// Create a new text chunker
    pub fn new(strategy: ChunkStrategy, max_chunk_chars: usize) -> Self {
        Self {
            strategy,
            max_chunk_chars: max_chunk_chars.max(1),
        }
    }

    /// Chunk the given text, never returning blank passages
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        match self.strategy {
            ChunkStrategy::ByParagraph => self.chunk_by_paragraph(text),
            ChunkStrategy::BySection => self.chunk_by_section(text),
        }
    }

    fn chunk_by_paragraph(&self, text: &str) -> Vec<String> {
        let paragraphs: Vec<&str> = text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        self.combine_until_limit(paragraphs)
    }

    fn chunk_by_section(&self, text: &str) -> Vec<String> {
        let mut sections = Vec::new();
        let mut current = String::new();

        for line in text.lines() {
            if line.trim_start().starts_with('#') && !current.trim().is_empty() {
                sections.push(current.trim().to_string());
                current.clear();
            }
            current.push_str(line);
            current.push('\n');
        }
        if !current.trim().is_empty() {
            sections.push(current.trim().to_string());
        }

        if sections.len() <= 1 {
            return self.chunk_by_paragraph(text);
        }
        self.combine_until_limit(sections)
    }

    /// Merge consecutive elements while they fit under the limit
    fn combine_until_limit<S: AsRef<str>>(&self, elements: Vec<S>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0;

        for element in elements {
            let element = element.as_ref();
            let element_chars = element.chars().count();

            if current_chars + element_chars + 2 > self.max_chunk_chars {
                if !current.is_empty() {
                    chunks.push(current.trim().to_string());
                    current.clear();
                    current_chars = 0;
                }
                if element_chars > self.max_chunk_chars {
                    chunks.extend(split_at_char_limit(element, self.max_chunk_chars));
                    continue;
                }
            }
            current.push_str(element);
            current.push_str("\n\n");
            current_chars += element_chars + 2;
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }
        chunks
    }
}

fn split_at_char_limit(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit)
        .map(|piece| piece.iter().collect::<String>())
        .filter(|piece| !piece.trim().is_empty())
        .collect()
}
