use clap::Parser;
use llm_daylog::commands::{report_command, ReportOptions};
use llm_daylog::config::{ApiKey, Backend, Config};
use llm_daylog::git::WalkOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "daylog")]
#[command(
    about = "Per-day commit report with effort estimates and LLM summaries",
    long_about = None
)]
struct Cli {
    /// Path to the git repository
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Only include commits by this author email
    #[arg(long)]
    author: Option<String>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,

    /// Skip LLM summaries entirely
    #[arg(long)]
    no_summary: bool,

    /// Summarizer backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Model identifier, e.g. qwen3:14b or gemini-1.5-flash
    #[arg(long)]
    model: Option<String>,

    /// Summarize large days in chunks (local backend)
    #[arg(long)]
    batch: bool,

    /// Chunk size in characters for --batch
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Local model server address (overrides OLLAMA_HOST)
    #[arg(long)]
    ollama_host: Option<String>,

    /// Hosted API key; GEMINI_API_KEY takes precedence
    #[arg(long)]
    gemini_api_key: Option<String>,

    /// Per-day summarization deadline in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Days summarized concurrently
    #[arg(long)]
    jobs: Option<usize>,

    /// Attempts per backend request
    #[arg(long)]
    max_attempts: Option<u32>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Walk every branch and tag instead of only the history reachable
    /// from HEAD (the default)
    #[arg(long)]
    all: bool,

    /// Skip merge commits
    #[arg(long)]
    no_merges: bool,

    /// Write the CSV report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_options(self) -> anyhow::Result<ReportOptions> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        let summarizer = &mut config.summarizer;
        if self.no_summary {
            summarizer.enabled = false;
        }
        if let Some(backend) = self.backend {
            summarizer.backend = backend;
        }
        if let Some(model) = self.model {
            summarizer.model = model;
        }
        if self.batch {
            summarizer.batch = true;
        }
        if let Some(size) = self.chunk_size {
            summarizer.max_chunk_chars = size;
        }
        if let Some(host) = self.ollama_host {
            summarizer.host = Some(host);
        }
        if let Some(key) = self.gemini_api_key {
            summarizer.api_key = Some(ApiKey::new(key));
        }
        if let Some(attempts) = self.max_attempts {
            summarizer.max_attempts = attempts;
        }
        if let Some(secs) = self.request_timeout {
            summarizer.request_timeout_secs = secs;
        }
        if let Some(secs) = self.timeout {
            config.pipeline.day_timeout_secs = secs;
        }
        if let Some(jobs) = self.jobs {
            config.pipeline.jobs = jobs;
        }

        config.summarizer = config
            .summarizer
            .with_environment(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(ReportOptions {
            repo_path: self.repo,
            walk: WalkOptions {
                author: self.author,
                start_date: self.start_date,
                end_date: self.end_date,
                skip_merges: self.no_merges,
                all_refs: self.all,
            },
            config,
            output: self.output,
        })
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "llm_daylog=info,daylog=info",
        1 => "llm_daylog=debug,daylog=debug",
        _ => "llm_daylog=trace,daylog=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.into_options() {
        Ok(options) => report_command(options).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
