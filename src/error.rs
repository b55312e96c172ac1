use thiserror::Error;

/// Errors produced by the reminder core and the storage layer around it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("instance count must be at least 1 (got {0})")]
    InvalidCount(u32),

    #[error("unknown repeat rule '{0}'. Supported: none, daily, weekly, monthly")]
    UnknownRepeat(String),

    #[error("unknown priority '{0}'. Supported: normal, important, urgent")]
    UnknownPriority(String),

    #[error("invalid date '{0}'. Use YYYY-MM-DD HH:MM")]
    InvalidDate(String),

    #[error("occurrence {0} falls outside the supported date range")]
    DateOutOfRange(u32),

    #[error("task title cannot be empty")]
    EmptyTitle,

    #[error("category name cannot be empty")]
    EmptyCategoryName,

    #[error("task '{0}' not found")]
    TaskNotFound(String),

    #[error("task id prefix '{0}' matches more than one task")]
    AmbiguousTaskId(String),

    #[error("category '{0}' not found")]
    CategoryNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
