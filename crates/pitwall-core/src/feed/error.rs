//! Feed errors

use thiserror::Error;

/// Errors that can fail one feed within a refresh cycle.
///
/// None of these are fatal to the system: the refresh loop decides whether
/// a failed feed is user-visible (while priming) or silently keeps the
/// last-known-good state (while live).
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed returned HTTP status {0}")]
    Status(u16),

    #[error("Feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Feed returned no records")]
    EmptyFeed,

    #[error("Feed header is missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("Invalid value '{value}' in column '{column}'")]
    InvalidField {
        column: &'static str,
        value: String,
    },
}
