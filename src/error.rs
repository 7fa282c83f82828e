use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the planning core.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A referenced file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A resource or plan payload is malformed.
    #[error("could not decode {0}")]
    Decode(String),

    /// The plan file was written by a newer schema revision.
    #[error("plan file version {found} is newer than supported version {supported}")]
    VersionMismatch { found: u32, supported: u32 },

    /// Internal consistency failure; always a bug.
    #[error("invariant violated on board {board}: {detail}")]
    InvariantViolation { board: usize, detail: String },

    /// An edit was rejected.
    #[error("rejected edit: {0}")]
    UserInput(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PlanError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(format!("JSON ({})", e))
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
