//! HTTP feed retrieval

use std::time::Duration;

use async_trait::async_trait;

use super::{Feed, FeedEndpoints, FeedError, FeedSource};

/// Default request timeout. A hung feed should cost one cycle, not stall
/// the loop forever.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Feed retrieval over HTTP(S).
pub struct HttpFeedSource {
    /// HTTP client for feed requests
    client: reqwest::Client,
    /// The two feed URLs
    endpoints: FeedEndpoints,
}

impl HttpFeedSource {
    /// Create a client for the given endpoints with the default timeout.
    pub fn new(endpoints: FeedEndpoints) -> Result<Self, FeedError> {
        Self::with_timeout(endpoints, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(endpoints: FeedEndpoints, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("PitWall/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { client, endpoints })
    }

    /// The configured endpoints.
    pub fn endpoints(&self) -> &FeedEndpoints {
        &self.endpoints
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, feed: Feed) -> Result<String, FeedError> {
        let response = self.client.get(self.endpoints.url(feed)).send().await?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> FeedEndpoints {
        FeedEndpoints {
            race_metadata: "https://example.com/race.csv".to_string(),
            leaderboard: "https://example.com/leaderboard.csv".to_string(),
        }
    }

    #[test]
    fn test_constructors_keep_their_settings() {
        let source = HttpFeedSource::new(endpoints()).unwrap();
        assert_eq!(
            source.endpoints().leaderboard,
            "https://example.com/leaderboard.csv"
        );

        let source = HttpFeedSource::with_timeout(endpoints(), Duration::from_secs(5));
        assert!(source.is_ok());
    }
}
