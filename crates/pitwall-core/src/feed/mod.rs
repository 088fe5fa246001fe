//! Feed retrieval
//!
//! The system's only data source is a pair of remotely hosted CSV files:
//! one for race metadata, one for the per-driver leaderboard. Retrieval is
//! a single GET per feed per cycle — no retry, no backoff, no caching.

mod error;
mod http;

pub use error::FeedError;
pub use http::HttpFeedSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which of the two fixed feeds to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// The single-record race state feed
    RaceMetadata,
    /// The per-driver standings feed
    Leaderboard,
}

impl Feed {
    /// Short name used in log messages.
    pub fn name(&self) -> &'static str {
        match self {
            Feed::RaceMetadata => "race_metadata",
            Feed::Leaderboard => "leaderboard",
        }
    }
}

/// URLs of the two feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEndpoints {
    /// Race metadata feed URL
    pub race_metadata: String,
    /// Leaderboard feed URL
    pub leaderboard: String,
}

impl FeedEndpoints {
    /// URL for the given feed.
    pub fn url(&self, feed: Feed) -> &str {
        match feed {
            Feed::RaceMetadata => &self.race_metadata,
            Feed::Leaderboard => &self.leaderboard,
        }
    }
}

/// A source of raw feed text.
///
/// This is the seam between the refresh loop and the outside world:
/// implemented by [`HttpFeedSource`] for real feeds, by
/// [`crate::demo::DemoFeed`] for offline operation, and by scripted doubles
/// in tests.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Retrieve the raw text of one feed.
    async fn fetch(&self, feed: Feed) -> Result<String, FeedError>;
}
