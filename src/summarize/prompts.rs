//! Prompt templates for the summarizers.

use crate::git::CommitRecord;

/// Marks the end of one commit inside a chunk
pub const SEPARATOR: &str = "---END-OF-DIFF---";

const MANAGEMENT_FRAMING: &str =
    "in a single sentence, from the perspective of a tech lead reporting to management";

/// Per-chunk template: factual bullet points for one batch of commits.
const CHUNK_TEMPLATE: &str = "\
### Task
You are a code-review assistant. Summarize the commit messages and git diffs below. \
Each commit ends with a line containing ---END-OF-DIFF---.

### Output style
- 3 to 5 bullet points, each at most 20 words
- Only factual changes; no opinions, no future plans
- Keep technical terms (API names, functions, files) exactly as they appear
- Past tense (\"Added...\", \"Fixed...\")
- Leave out author names, ticket numbers and formatting-only changes
- Plain text: no markdown, no code blocks, no emojis, no links

### Input
";

/// Master template: merge chunk summaries into one sentence.
const SYNTHESIS_TEMPLATE: &str = "\
### Task
You are a release-notes assistant. The notes below summarize consecutive batches of \
commits from the same day. Merge duplicates, group related changes and keep the \
highest-level view, then write the result ";

/// One chunk entry: message, diff and separator, each on its own line.
pub fn chunk_entry(commit: &CommitRecord) -> String {
    format!("{}\n{}\n{}\n", commit.message, commit.diff, SEPARATOR)
}

pub fn chunk_prompt(chunk: &str) -> String {
    format!("{}{}", CHUNK_TEMPLATE, chunk)
}

pub fn synthesis_prompt(partials: &[String]) -> String {
    format!(
        "{}{}.\nFacts only, past tense, plain text.\n\n### Input\n{}",
        SYNTHESIS_TEMPLATE,
        MANAGEMENT_FRAMING,
        partials.join("\n")
    )
}

/// Single-shot prompt for hosted models: messages and diffs.
pub fn remote_prompt(commits: &[CommitRecord]) -> String {
    let messages: Vec<&str> = commits.iter().map(|c| c.message.as_str()).collect();
    let diffs: Vec<&str> = commits.iter().map(|c| c.diff.as_str()).collect();
    format!(
        "Summarize the following git commits and their diffs {}:\n\nCommits:\n{}\n\nDiffs:\n{}",
        MANAGEMENT_FRAMING,
        messages.join("\n---\n"),
        diffs.join("\n---\n")
    )
}

/// Single-shot prompt for local models: messages only, to stay small.
pub fn local_prompt(commits: &[CommitRecord]) -> String {
    let messages: Vec<&str> = commits.iter().map(|c| c.message.as_str()).collect();
    format!(
        "Summarize the following git commits {}:\n\nCommits:\n{}",
        MANAGEMENT_FRAMING,
        messages.join("\n---\n")
    )
}
