//! Error types for the question oracle.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleError {
    /// The remote provider returned a malformed or unparseable batch.
    #[error("parse error: {0}")]
    Parse(String),

    /// Transport-level failure reaching the remote provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Both the remote provider and the fallback pool came up short.
    #[error("could not assemble {needed} questions ({available} available)")]
    InsufficientQuestions { needed: usize, available: usize },
}
