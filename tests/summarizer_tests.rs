use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use llm_daylog::commands::build_report;
use llm_daylog::config::PipelineConfig;
use llm_daylog::error::SummarizationError;
use llm_daylog::git::CommitRecord;
use llm_daylog::llm::{Generation, TextGenerator};
use llm_daylog::summarize::prompts::SEPARATOR;
use llm_daylog::summarize::{ChunkedSummarizer, Summarizer};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Backend that replays queued replies and records every prompt it sees
#[derive(Default)]
struct Scripted {
    replies: Mutex<VecDeque<Result<String, SummarizationError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl Scripted {
    fn replying(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            ..Default::default()
        })
    }

    fn with_replies(replies: Vec<Result<String, SummarizationError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate(&self, prompt: &str) -> Result<Generation, SummarizationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok("default reply".to_string()))
            .map(Generation::from_text)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn commit(hash: &str, day: u32, message: &str) -> CommitRecord {
    CommitRecord {
        hash: hash.to_string(),
        author: "Dev <dev@example.com>".to_string(),
        author_email: "dev@example.com".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 7, day, 15, 30, 0).unwrap(),
        message: message.to_string(),
        lines_added: 10,
        lines_deleted: 2,
        diff: String::new(),
    }
}

// "x\n\n---END-OF-DIFF---\n" is 21 characters for a one-letter message
const SMALL_ENTRY_CHARS: usize = 21;

#[tokio::test]
async fn test_noop_never_produces_text() {
    let summarizer = Summarizer::NoOp;
    let commits = vec![commit("a", 1, "anything")];
    assert_eq!(summarizer.summarize(&commits).await.unwrap(), "");
}

#[tokio::test]
async fn test_empty_day_skips_backend() {
    let backend = Scripted::replying(&[]);
    let summarizer = Summarizer::SingleShotLocal(backend.clone());
    assert_eq!(summarizer.summarize(&[]).await.unwrap(), "");
    assert!(backend.prompts().is_empty());
}

#[tokio::test]
async fn test_single_shot_local_strips_reasoning() {
    let backend = Scripted::replying(&["<think>\nhmm, let me see\n</think>\n\nShipped the login page."]);
    let summarizer = Summarizer::SingleShotLocal(backend.clone());

    let summary = summarizer
        .summarize(&[commit("a", 1, "Add login page")])
        .await
        .unwrap();

    assert_eq!(summary, "Shipped the login page.");
    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Add login page"));
}

#[tokio::test]
async fn test_single_shot_remote_sends_diffs() {
    let backend = Scripted::replying(&["  Reworked caching.  "]);
    let summarizer = Summarizer::SingleShotRemote(backend.clone());
    let mut record = commit("a", 1, "Cache tweaks");
    record.diff = "+let ttl = 60;".to_string();

    let summary = summarizer.summarize(&[record]).await.unwrap();

    assert_eq!(summary, "Reworked caching.");
    assert!(backend.prompts()[0].contains("+let ttl = 60;"));
}

#[tokio::test]
async fn test_reasoning_only_reply_is_empty_response() {
    let backend = Scripted::replying(&["<think>nothing useful</think>   "]);
    let summarizer = Summarizer::SingleShotLocal(backend);

    let err = summarizer
        .summarize(&[commit("a", 1, "Tidy up")])
        .await
        .unwrap_err();

    assert!(matches!(err, SummarizationError::EmptyResponse { .. }));
}

#[tokio::test]
async fn test_chunked_below_threshold_makes_two_calls() {
    let backend = Scripted::replying(&["- did a and b", "Did a and b."]);
    let summarizer = ChunkedSummarizer::new(backend.clone(), 8192);

    let summary = summarizer
        .summarize(&[commit("1", 1, "a"), commit("2", 1, "b")])
        .await
        .unwrap();

    assert_eq!(summary, "Did a and b.");
    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains(&format!("a\n\n{}\n", SEPARATOR)));
    assert!(prompts[0].contains(&format!("b\n\n{}\n", SEPARATOR)));
    assert!(prompts[1].contains("- did a and b"));
}

#[tokio::test]
async fn test_chunked_flushes_in_order() {
    let backend = Scripted::replying(&["<think>x</think>first part", "second part", "All of it."]);
    let summarizer = ChunkedSummarizer::new(backend.clone(), SMALL_ENTRY_CHARS * 2 + 5);

    let summary = summarizer
        .summarize(&[commit("1", 1, "a"), commit("2", 1, "b"), commit("3", 1, "c")])
        .await
        .unwrap();

    assert_eq!(summary, "All of it.");
    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("a\n") && prompts[0].contains("b\n"));
    assert!(!prompts[0].contains(&format!("c\n\n{}", SEPARATOR)));
    assert!(prompts[1].contains(&format!("c\n\n{}", SEPARATOR)));

    // Synthesis sees both cleaned partials, in chunk order
    let synthesis = &prompts[2];
    let first = synthesis.find("first part").unwrap();
    let second = synthesis.find("second part").unwrap();
    assert!(first < second);
    assert!(!synthesis.contains("<think>"));
}

#[tokio::test]
async fn test_oversized_commit_is_its_own_chunk() {
    let backend = Scripted::replying(&["one", "two", "done"]);
    let summarizer = ChunkedSummarizer::new(backend.clone(), 10);

    summarizer
        .summarize(&[commit("1", 1, "a long commit message"), commit("2", 1, "b")])
        .await
        .unwrap();

    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("a long commit message"));
}

#[tokio::test]
async fn test_chunk_failure_stops_the_run() {
    let backend = Scripted::with_replies(vec![Err(SummarizationError::Transport {
        backend: "scripted".to_string(),
        details: "connection refused".to_string(),
        status: None,
    })]);
    let summarizer = ChunkedSummarizer::new(backend.clone(), SMALL_ENTRY_CHARS);

    let err = summarizer
        .summarize(&[commit("1", 1, "a"), commit("2", 1, "b")])
        .await
        .unwrap_err();

    assert!(matches!(err, SummarizationError::Transport { status: None, .. }));
    assert_eq!(backend.prompts().len(), 1);
}

fn server_error() -> SummarizationError {
    SummarizationError::Transport {
        backend: "scripted".to_string(),
        details: "internal error".to_string(),
        status: Some(500),
    }
}

#[tokio::test]
async fn test_second_chunk_failure_skips_synthesis() {
    let backend = Scripted::with_replies(vec![Ok("- did a".to_string()), Err(server_error())]);
    let summarizer = ChunkedSummarizer::new(backend.clone(), SMALL_ENTRY_CHARS);

    let err = summarizer
        .summarize(&[commit("1", 1, "a"), commit("2", 1, "b"), commit("3", 1, "c")])
        .await
        .unwrap_err();

    assert!(matches!(err, SummarizationError::Transport { status: Some(500), .. }));
    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains(&format!("b\n\n{}", SEPARATOR)));
}

#[tokio::test]
async fn test_synthesis_failure_is_returned() {
    let backend = Scripted::with_replies(vec![
        Ok("- did a".to_string()),
        Ok("- did b".to_string()),
        Err(server_error()),
    ]);
    let summarizer = ChunkedSummarizer::new(backend.clone(), SMALL_ENTRY_CHARS);

    let err = summarizer
        .summarize(&[commit("1", 1, "a"), commit("2", 1, "b")])
        .await
        .unwrap_err();

    assert!(matches!(err, SummarizationError::Transport { status: Some(500), .. }));
    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[2].contains("- did a") && prompts[2].contains("- did b"));
}

#[tokio::test]
async fn test_trace_only_chunk_reply_aborts() {
    let backend = Scripted::replying(&["<think>only thinking</think>\n", "- did b", "All done."]);
    let summarizer = ChunkedSummarizer::new(backend.clone(), SMALL_ENTRY_CHARS);

    let err = summarizer
        .summarize(&[commit("1", 1, "a"), commit("2", 1, "b")])
        .await
        .unwrap_err();

    assert!(matches!(err, SummarizationError::EmptyResponse { .. }));
    assert_eq!(backend.prompts().len(), 1);
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let backend = Scripted::slow(Duration::from_millis(500));
    let summarizer = Summarizer::SingleShotLocal(backend);

    let err = summarizer
        .summarize_within(&[commit("1", 1, "a")], Duration::from_millis(20))
        .await
        .unwrap_err();

    assert!(matches!(err, SummarizationError::Timeout { .. }));
}

#[tokio::test]
async fn test_pipeline_isolates_failing_day() {
    let backend = Scripted::with_replies(vec![
        Ok("Monday work.".to_string()),
        Err(SummarizationError::Transport {
            backend: "scripted".to_string(),
            details: "server error".to_string(),
            status: Some(503),
        }),
        Ok("Wednesday work.".to_string()),
    ]);
    let summarizer = Summarizer::SingleShotLocal(backend);
    let commits = vec![commit("a", 1, "mon"), commit("b", 2, "tue"), commit("c", 3, "wed")];

    let days = build_report(commits, &summarizer, &PipelineConfig::default(), &|_, _| {}).await;

    let narratives: Vec<_> = days.iter().map(|d| d.narrative.as_str()).collect();
    assert_eq!(narratives, vec!["Monday work.", "", "Wednesday work."]);
    assert!(days.iter().all(|d| d.effort > 0.0));
}
