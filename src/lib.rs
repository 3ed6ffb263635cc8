pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod report;
pub mod summarize;

pub use config::Config;
pub use error::{Error, Result};
