//! Error types for daylog
//!
//! Failure modes are grouped by the stage that produces them:
//! - Git operations (repo access, history walking, diff rendering)
//! - Summarization (transport failures, empty replies, deadlines)
//! - Configuration (missing credentials, bad values, unreadable config files)
//! - Report output (CSV encoding, file I/O)

use std::fmt;
use std::io;

/// Result type alias for daylog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for daylog
#[derive(Debug)]
pub enum Error {
    /// Commit extraction errors
    Git(GitError),
    /// Summarization backend errors
    Summarization(SummarizationError),
    /// Startup configuration errors
    Config(ConfigError),
    /// Report rendering errors
    Report(ReportError),
    /// I/O errors
    Io(IoError),
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
    /// Directory is not a git repository
    RepositoryNotFound { path: String, source: String },
    /// Commit hash not found in repository
    CommitNotFound(String),
    /// Underlying git2 library error
    GitCommandFailed { operation: String, source: String },
}

/// Summarization errors, recovered per day by the pipeline
#[derive(Debug)]
pub enum SummarizationError {
    /// Network, HTTP status or authentication failure talking to a backend
    Transport {
        backend: String,
        details: String,
        status: Option<u16>,
    },
    /// Backend answered without usable text
    EmptyResponse { backend: String },
    /// The per-day deadline elapsed
    Timeout { secs: u64 },
}

/// Configuration errors, fatal at startup
#[derive(Debug)]
pub enum ConfigError {
    /// Credential required by the selected backend is missing
    MissingCredential { backend: String, env_var: String },
    /// Option value cannot be used
    InvalidValue { field: String, details: String },
    /// Config file could not be parsed
    ParseFailed { path: String, source: String },
}

/// Report writer errors
#[derive(Debug)]
pub enum ReportError {
    /// CSV encoder failed
    EncodeFailed(String),
}

/// File I/O errors
#[derive(Debug)]
pub enum IoError {
    /// Failed to read file
    FileReadFailed { path: String, source: io::Error },
    /// Failed to write file
    FileWriteFailed { path: String, source: io::Error },
    /// Other I/O error
    Other(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Git(e) => write!(f, "Git error: {}", e),
            Error::Summarization(e) => write!(f, "Summarization error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Report(e) => write!(f, "Report error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl fmt::Display for GitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitError::RepositoryNotFound { path, source } => {
                write!(f, "Failed to open git repository at {}: {}", path, source)
            }
            GitError::CommitNotFound(hash) => {
                write!(f, "Commit not found: {}", hash)
            }
            GitError::GitCommandFailed { operation, source } => {
                write!(f, "Git operation '{}' failed: {}", operation, source)
            }
        }
    }
}

impl fmt::Display for SummarizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummarizationError::Transport {
                backend,
                details,
                status,
            } => match status {
                Some(code) => write!(f, "Request to {} failed ({}): {}", backend, code, details),
                None => write!(f, "Request to {} failed: {}", backend, details),
            },
            SummarizationError::EmptyResponse { backend } => {
                write!(f, "No summary generated by {}", backend)
            }
            SummarizationError::Timeout { secs } => {
                write!(f, "Summarization timed out after {}s", secs)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingCredential { backend, env_var } => {
                write!(
                    f,
                    "{} API key is required (set {} or pass it explicitly)",
                    backend, env_var
                )
            }
            ConfigError::InvalidValue { field, details } => {
                write!(f, "Invalid value for '{}': {}", field, details)
            }
            ConfigError::ParseFailed { path, source } => {
                write!(f, "Failed to parse config file {}: {}", path, source)
            }
        }
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::EncodeFailed(details) => write!(f, "Failed to write CSV: {}", details),
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::FileReadFailed { path, source } => {
                write!(f, "Failed to read {}: {}", path, source)
            }
            IoError::FileWriteFailed { path, source } => {
                write!(f, "Failed to write {}: {}", path, source)
            }
            IoError::Other(source) => write!(f, "{}", source),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(IoError::FileReadFailed { source, .. })
            | Error::Io(IoError::FileWriteFailed { source, .. })
            | Error::Io(IoError::Other(source)) => Some(source),
            _ => None,
        }
    }
}

impl std::error::Error for GitError {}
impl std::error::Error for SummarizationError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ReportError {}
impl std::error::Error for IoError {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(IoError::Other(err))
    }
}

impl From<SummarizationError> for Error {
    fn from(err: SummarizationError) -> Self {
        Error::Summarization(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Report(ReportError::EncodeFailed(err.to_string()))
    }
}

impl SummarizationError {
    /// Check if a failed request is worth repeating (network issues,
    /// rate limits, server-side errors)
    pub fn is_retryable(&self) -> bool {
        match self {
            SummarizationError::Transport { status: None, .. } => true,
            SummarizationError::Transport {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_git_error_display() {
        let err = Error::Git(GitError::RepositoryNotFound {
            path: "/tmp/notgit".to_string(),
            source: "could not find repository".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Git error: Failed to open git repository at /tmp/notgit: could not find repository"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let err = Error::Summarization(SummarizationError::Transport {
            backend: "ollama".to_string(),
            details: "connection refused".to_string(),
            status: None,
        });
        assert_eq!(
            err.to_string(),
            "Summarization error: Request to ollama failed: connection refused"
        );

        let with_status = SummarizationError::Transport {
            backend: "gemini".to_string(),
            details: "quota".to_string(),
            status: Some(429),
        };
        assert_eq!(with_status.to_string(), "Request to gemini failed (429): quota");
    }

    #[test]
    fn test_missing_credential_display() {
        let err = Error::Config(ConfigError::MissingCredential {
            backend: "Gemini".to_string(),
            env_var: "GEMINI_API_KEY".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: Gemini API key is required (set GEMINI_API_KEY or pass it explicitly)"
        );
    }

    #[test]
    fn test_is_retryable() {
        let network = SummarizationError::Transport {
            backend: "ollama".to_string(),
            details: "reset".to_string(),
            status: None,
        };
        assert!(network.is_retryable());

        let throttled = SummarizationError::Transport {
            backend: "gemini".to_string(),
            details: "slow down".to_string(),
            status: Some(429),
        };
        assert!(throttled.is_retryable());

        let unauthorized = SummarizationError::Transport {
            backend: "gemini".to_string(),
            details: "bad key".to_string(),
            status: Some(401),
        };
        assert!(!unauthorized.is_retryable());

        let empty = SummarizationError::EmptyResponse {
            backend: "ollama".to_string(),
        };
        assert!(!empty.is_retryable());
    }

    #[test]
    fn test_summarization_error_converts() {
        let err: Error = SummarizationError::Timeout { secs: 5 }.into();
        assert_eq!(err.to_string(), "Summarization error: Summarization timed out after 5s");
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::Io(IoError::Other(io_err));
        assert!(err.source().is_some());
    }
}
