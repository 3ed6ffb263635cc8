//! Chunked map-reduce summarization for days whose commits do not fit in
//! one prompt.
//!
//! Commits are packed, in order, into chunks of at most `max_chunk_chars`
//! characters. Each chunk is summarized on its own with the per-chunk
//! template; the partial summaries are then merged by one final synthesis
//! call. A commit larger than the limit becomes a chunk of its own and is
//! never split.

use crate::error::SummarizationError;
use crate::git::CommitRecord;
use crate::llm::TextGenerator;
use crate::summarize::cleanup::clean_response;
use crate::summarize::prompts::{chunk_entry, chunk_prompt, synthesis_prompt};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_MAX_CHUNK_CHARS: usize = 8192;

/// Accumulates commit entries and hands back a full chunk whenever the
/// next entry would push it past the limit.
#[derive(Debug)]
pub struct ChunkBuffer {
    text: String,
    chars: usize,
    limit: usize,
}

impl ChunkBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            text: String::new(),
            chars: 0,
            limit,
        }
    }

    /// Append `entry`. If the buffer already holds something and the entry
    /// would overflow it, the previous contents are returned as a finished
    /// chunk first.
    pub fn push(&mut self, entry: &str) -> Option<String> {
        let entry_chars = entry.chars().count();
        let flushed = if self.chars > 0 && self.chars + entry_chars > self.limit {
            Some(self.take())
        } else {
            None
        };
        self.text.push_str(entry);
        self.chars += entry_chars;
        flushed
    }

    /// Remaining contents, if any.
    pub fn finish(mut self) -> Option<String> {
        if self.chars == 0 {
            None
        } else {
            Some(self.take())
        }
    }

    fn take(&mut self) -> String {
        self.chars = 0;
        std::mem::take(&mut self.text)
    }
}

#[derive(Clone)]
pub struct ChunkedSummarizer {
    backend: Arc<dyn TextGenerator>,
    max_chunk_chars: usize,
}

impl std::fmt::Debug for ChunkedSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedSummarizer")
            .field("backend", &self.backend.name())
            .field("max_chunk_chars", &self.max_chunk_chars)
            .finish()
    }
}

impl ChunkedSummarizer {
    pub fn new(backend: Arc<dyn TextGenerator>, max_chunk_chars: usize) -> Self {
        Self {
            backend,
            max_chunk_chars: max_chunk_chars.max(1),
        }
    }

    /// Summarize all commits as one sentence. The first failing backend
    /// call aborts the run and partial results are dropped.
    pub async fn summarize(&self, commits: &[CommitRecord]) -> Result<String, SummarizationError> {
        if commits.is_empty() {
            return Ok(String::new());
        }

        let mut buffer = ChunkBuffer::new(self.max_chunk_chars);
        let mut partials = Vec::new();

        for commit in commits {
            if let Some(chunk) = buffer.push(&chunk_entry(commit)) {
                let summary = self.summarize_chunk(&chunk, partials.len() + 1).await?;
                partials.push(summary);
            }
        }
        if let Some(chunk) = buffer.finish() {
            let summary = self.summarize_chunk(&chunk, partials.len() + 1).await?;
            partials.push(summary);
        }

        info!(
            "Merging {} chunk summaries from {} commits",
            partials.len(),
            commits.len()
        );

        let reply = self.backend.generate(&synthesis_prompt(&partials)).await?;
        clean_response(self.backend.name(), &reply.text)
    }

    async fn summarize_chunk(&self, chunk: &str, index: usize) -> Result<String, SummarizationError> {
        debug!("Summarizing chunk {} ({} chars)", index, chunk.chars().count());
        let reply = self.backend.generate(&chunk_prompt(chunk)).await?;
        clean_response(self.backend.name(), &reply.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_never_flushes_when_empty() {
        let mut buffer = ChunkBuffer::new(4);
        assert_eq!(buffer.push("oversized entry"), None);
        assert_eq!(buffer.push("x"), Some("oversized entry".to_string()));
        assert_eq!(buffer.finish(), Some("x".to_string()));
    }

    #[test]
    fn test_buffer_fills_up_to_limit() {
        let mut buffer = ChunkBuffer::new(6);
        assert_eq!(buffer.push("abc"), None);
        assert_eq!(buffer.push("def"), None);
        assert_eq!(buffer.push("g"), Some("abcdef".to_string()));
        assert_eq!(buffer.finish(), Some("g".to_string()));
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        let mut buffer = ChunkBuffer::new(4);
        assert_eq!(buffer.push("éé"), None);
        assert_eq!(buffer.push("üü"), None);
        assert!(buffer.push("a").is_some());
    }

    #[test]
    fn test_empty_buffer_finishes_to_none() {
        assert_eq!(ChunkBuffer::new(10).finish(), None);
    }
}
