//! Error types for the renumbering engine.

use std::path::PathBuf;

/// Everything that can go wrong while renumbering a tree.
#[derive(Debug, thiserror::Error)]
pub enum RenameError {
    /// A root or season directory is missing or unreadable.
    #[error("cannot read directory '{}': {source}", path.display())]
    InvalidPath {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A folder or file name contains no digit run. Callers treat this as
    /// "skip the entry", never as a fatal condition.
    #[error("no digits found in '{0}'")]
    NoDigitsFound(String),

    /// The underlying rename call failed. Collected into the run summary;
    /// never aborts the batch.
    #[error("failed to rename '{}' -> '{}': {source}", from.display(), to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// A command-line argument could not be accepted.
    #[error("invalid argument: {0}")]
    MalformedArgument(String),
}

pub type Result<T> = std::result::Result<T, RenameError>;
