//! Sentence-aware text chunking for embedding.
//!
//! Long documents are split into overlapping windows so each embedding stays
//! focused while context still carries across window boundaries.

use crate::config::ChunkingConfig;
use thiserror::Error;

/// Errors raised for unusable chunking parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("max chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("overlap ({overlap}) must be smaller than the max chunk size ({max})")]
    OverlapTooLarge { overlap: usize, max: usize },
}

/// Result type for chunking operations.
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Splits text into overlapping, sentence-boundary-aware chunks.
///
/// Sizes are measured in characters, not bytes, so multi-byte text is never
/// cut inside a code point.
#[derive(Debug, Clone)]
pub struct Chunker {
    max_chunk_size: usize,
    overlap: usize,
    boundary_ratio: f32,
    min_chunk_chars: usize,
}

impl Chunker {
    /// Creates a chunker with the default sentence-break ratio (0.7) and
    /// minimum chunk length (50).
    ///
    /// # Errors
    ///
    /// Returns an error if `max_chunk_size` is zero or `overlap` is not
    /// smaller than it.
    pub fn new(max_chunk_size: usize, overlap: usize) -> Result<Self> {
        if max_chunk_size == 0 {
            return Err(ChunkError::ZeroChunkSize);
        }
        if overlap >= max_chunk_size {
            return Err(ChunkError::OverlapTooLarge {
                overlap,
                max: max_chunk_size,
            });
        }

        Ok(Self {
            max_chunk_size,
            overlap,
            boundary_ratio: 0.7,
            min_chunk_chars: 50,
        })
    }

    /// Builds a chunker from a config section.
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Ok(Self::new(config.chunk_size, config.chunk_overlap)?
            .with_boundary_ratio(config.boundary_ratio)
            .with_min_chunk_chars(config.min_chunk_chars))
    }

    pub fn with_boundary_ratio(mut self, ratio: f32) -> Self {
        self.boundary_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_min_chunk_chars(mut self, min_chunk_chars: usize) -> Self {
        self.min_chunk_chars = min_chunk_chars;
        self
    }

    /// Returns an iterator over the chunks of `text`.
    ///
    /// Empty input yields nothing. The iterator is consumed as it goes; call
    /// `split` again to start over.
    pub fn split<'a>(&self, text: &'a str) -> Chunks<'a> {
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());

        Chunks {
            text,
            offsets,
            start: 0,
            finished: text.is_empty(),
            max_chunk_size: self.max_chunk_size,
            overlap: self.overlap,
            boundary_after: (self.max_chunk_size as f32 * self.boundary_ratio) as usize,
            min_chunk_chars: self.min_chunk_chars,
        }
    }
}

/// Iterator returned by [`Chunker::split`].
pub struct Chunks<'a> {
    text: &'a str,
    /// Byte offset of every char, plus the text length.
    offsets: Vec<usize>,
    /// Window start, in chars.
    start: usize,
    finished: bool,
    max_chunk_size: usize,
    overlap: usize,
    boundary_after: usize,
    min_chunk_chars: usize,
}

impl<'a> Chunks<'a> {
    fn char_len(&self) -> usize {
        self.offsets.len() - 1
    }

    fn slice(&self, from: usize, to: usize) -> &'a str {
        &self.text[self.offsets[from]..self.offsets[to]]
    }

    /// Finds where the current window should end, in chars.
    fn window_end(&self) -> usize {
        let len = self.char_len();
        let hard_end = (self.start + self.max_chunk_size).min(len);
        if hard_end == len {
            return hard_end;
        }

        let window = self.slice(self.start, hard_end);
        let break_at = window
            .char_indices()
            .enumerate()
            .filter(|(_, (_, c))| *c == '.' || *c == '\n')
            .map(|(pos, _)| pos)
            .last();

        match break_at {
            Some(pos) if pos > self.boundary_after => self.start + pos + 1,
            _ => hard_end,
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while !self.finished {
            let len = self.char_len();
            let end = self.window_end();
            let chunk = self.slice(self.start, end).trim();

            if end >= len {
                self.finished = true;
            } else {
                // Always advance, even when a sentence break sits inside the overlap.
                self.start = end.saturating_sub(self.overlap).max(self.start + 1);
            }

            if chunk.chars().count() >= self.min_chunk_chars {
                return Some(chunk.to_string());
            }
        }
        None
    }
}
