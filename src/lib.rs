pub mod config;
pub mod discover;
pub mod index;
pub mod parser;
pub mod query;
pub mod resolve;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that cross the library boundary.
///
/// Query-level "not found" conditions are values (`None`, empty vecs, or
/// `{error: "file-not-found"}` sentinels), never `Err` — see the query
/// modules. These variants cover input validation, IO at build start, and
/// git integration.
#[derive(Debug, Error)]
pub enum UcnError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("project root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("not a git repository (git diff exited nonzero)")]
    NotAGitRepo,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache error: {0}")]
    Cache(String),
}

pub type Result<T, E = UcnError> = std::result::Result<T, E>;
