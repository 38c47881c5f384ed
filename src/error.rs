use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`crate::Editor`] construction and persistence.
///
/// Mutation (`insert`/`delete`) and history (`undo`/`redo`) stay on plain
/// `bool` returns: a fast-path miss or an empty undo stack is a normal
/// outcome, not a failure to report here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path:?} is not a regular file")]
    NotRegularFile { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;
