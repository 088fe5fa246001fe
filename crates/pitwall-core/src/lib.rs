//! # PitWall Core Library
//!
//! Polling core for a live race leaderboard display.

#![warn(missing_docs)]

//!
//! This library provides:
//! - CSV feed parsing (header line + comma-separated records, no quoting)
//! - Feed retrieval from the two fixed endpoints (race metadata, leaderboard)
//! - Position-change tracking between refresh cycles
//! - A timer-driven refresh loop publishing read-only state to consumers
//! - A demo feed simulator for running without a network
//!
//! ## Example
//!
//! ```rust,ignore
//! use pitwall_core::prelude::*;
//!
//! let endpoints = FeedEndpoints {
//!     race_metadata: "https://example.com/race.csv".into(),
//!     leaderboard: "https://example.com/leaderboard.csv".into(),
//! };
//! let source = HttpFeedSource::new(endpoints)?;
//! let handle = RefreshLoop::new(source, RefreshConfig::default()).spawn();
//!
//! let mut states = handle.states();
//! while states.changed().await.is_ok() {
//!     let state = states.borrow_and_update().clone();
//!     for driver in &state.snapshot {
//!         println!("P{} {}", driver.running_position, driver.full_name);
//!     }
//! }
//! ```

pub mod csv;
pub mod demo;
pub mod feed;
pub mod model;
pub mod refresh;
pub mod standings;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::csv::{Row, Table};
    pub use crate::demo::DemoFeed;
    pub use crate::feed::{Feed, FeedEndpoints, FeedError, FeedSource, HttpFeedSource};
    pub use crate::model::{
        BoolEncoding, DeltaClass, DeltaConvention, DriverStanding, FlagState, RaceMetadata,
    };
    pub use crate::refresh::{
        LeaderboardState, Lifecycle, RefreshConfig, RefreshHandle, RefreshLoop,
    };
    pub use crate::standings::{PositionChange, PositionHistory, Trend};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
