
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;

/// A contiguous piece of the document, ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in the emitted sequence
    pub index: usize,
    /// The chunk text
    pub content: String,
    /// Character offset of the first character in the source text
    pub start: usize,
    /// Character offset one past the last character in the source text
    pub end: usize,
}

impl Chunk {
    /// Length of the chunk in characters
    #[inline]
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Configuration for splitting document text into chunks.
///
/// All sizes are measured in characters, not bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length
    pub max_size: usize,
    /// Characters shared between consecutive chunks
    pub overlap: usize,
    /// Split right after this string when it occurs inside the window
    pub preferred_boundary: String,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_size: 1000,
            overlap: 150,
            preferred_boundary: "\n".to_string(),
        }
    }
}

impl ChunkingConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::InvalidMaxSize(self.max_size));
        }

        if self.overlap >= self.max_size {
            return Err(ConfigError::OverlapTooLarge(self.overlap, self.max_size));
        }

        Ok(())
    }
}

/// Split document text into overlapping chunks.
///
/// Each chunk holds at most `max_size` characters. When the text does not fit
/// in the current window, the chunk ends right after the last
/// `preferred_boundary` inside it, falling back to a hard cut at `max_size`.
/// The next chunk starts `overlap` characters before the end of the previous
/// one, so neighbours always share exactly `overlap` characters.
#[inline]
pub fn split_text(text: &str, config: &ChunkingConfig) -> crate::Result<Vec<Chunk>> {
    config.validate()?;

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    let boundary: Vec<char> = config.preferred_boundary.chars().collect();
    let stride = config.max_size - config.overlap;
    let mut chunks = Vec::with_capacity(chars.len().div_ceil(stride));
    let mut start = 0;

    loop {
        let window_end = (start + config.max_size).min(chars.len());
        let end = if window_end == chars.len() {
            window_end
        } else {
            find_boundary_split(&chars, start, window_end, &boundary, config.overlap)
                .unwrap_or(window_end)
        };

        chunks.push(Chunk {
            index: chunks.len(),
            content: chars[start..end].iter().collect(),
            start,
            end,
        });

        if end == chars.len() {
            break;
        }

        // end > start + overlap, so this always moves forward
        start = end - config.overlap;
    }

    debug!(
        "Split {} characters into {} chunks (max {} chars, overlap {})",
        chars.len(),
        chunks.len(),
        config.max_size,
        config.overlap
    );

    Ok(chunks)
}

/// Find the split point right after the last boundary inside the window.
///
/// Only split points that leave the chunk longer than `overlap` qualify.
fn find_boundary_split(
    chars: &[char],
    start: usize,
    window_end: usize,
    boundary: &[char],
    overlap: usize,
) -> Option<usize> {
    if boundary.is_empty() || window_end - start < boundary.len() {
        return None;
    }

    let min_end = start + overlap + 1;
    (start + boundary.len()..=window_end)
        .rev()
        .take_while(|&end| end >= min_end)
        .find(|&end| chars[end - boundary.len()..end] == *boundary)
}
