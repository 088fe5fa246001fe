//! Refresh loop
//!
//! Orchestrates fetch → parse → diff → publish on a fixed timer. The loop
//! exclusively owns the published state; consumers get read-only clones
//! through a watch channel and never mutate them.
//!
//! The loop has two lifecycle states. While **priming** (no successful
//! snapshot yet) a failed cycle is surfaced as a user-visible error, so an
//! unreachable feed does not leave an empty table with no explanation.
//! Once **live**, failures are swallowed: the last-known-good snapshot and
//! race metadata stay authoritative and the loop simply tries again next
//! tick. A transient blip must never blank out a working leaderboard.
//!
//! The loop goes live once both published values are populated (race
//! metadata present and a non-empty snapshot), even when the two feeds
//! first succeeded on different cycles. Requiring both to succeed within a
//! single cycle could report an error over a fully populated board.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::csv::Table;
use crate::feed::{Feed, FeedError, FeedSource};
use crate::model::{BoolEncoding, DriverStanding, RaceMetadata};
use crate::standings::{sort_by_position, PositionChange, PositionHistory};

/// Lifecycle of the refresh loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// No successful snapshot published yet; failures are user-visible
    Priming,
    /// At least one snapshot published; failures keep last-known-good state
    Live,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::Priming
    }
}

/// Refresh loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between refresh cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Boolean encoding used by this deployment's feeds
    #[serde(default)]
    pub bool_encoding: BoolEncoding,
}

fn default_interval_secs() -> u64 {
    10
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            bool_encoding: BoolEncoding::default(),
        }
    }
}

impl RefreshConfig {
    /// The refresh interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Everything a display needs to render one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardState {
    /// Race metadata from the most recent successful fetch
    pub race: Option<RaceMetadata>,
    /// Standings ordered ascending by running position
    pub snapshot: Vec<DriverStanding>,
    /// Positions from the snapshot before this one
    pub history: PositionHistory,
    /// Whether the loop is still priming
    pub lifecycle: Lifecycle,
    /// User-visible error; only set while priming
    pub last_error: Option<String>,
}

impl LeaderboardState {
    /// True once the first snapshot has been published.
    pub fn is_live(&self) -> bool {
        self.lifecycle == Lifecycle::Live
    }

    /// Movement of a driver in this snapshot relative to the previous one.
    pub fn position_change(&self, driver: &DriverStanding) -> PositionChange {
        self.history
            .change(&driver.driver_id, driver.running_position)
    }
}

/// The refresh loop: owns the published state and drives the per-cycle
/// fetch/parse/diff/publish sequence.
pub struct RefreshLoop<S> {
    source: S,
    config: RefreshConfig,
    state: LeaderboardState,
    publish: watch::Sender<LeaderboardState>,
}

impl<S: FeedSource> RefreshLoop<S> {
    /// Create a loop over the given feed source. Nothing is fetched until
    /// the first [`tick`](Self::tick).
    pub fn new(source: S, config: RefreshConfig) -> Self {
        let (publish, _) = watch::channel(LeaderboardState::default());
        Self {
            source,
            config,
            state: LeaderboardState::default(),
            publish,
        }
    }

    /// Subscribe to published states. Every tick publishes, including while
    /// priming, so consumers can render the error condition.
    pub fn states(&self) -> watch::Receiver<LeaderboardState> {
        self.publish.subscribe()
    }

    /// The current state, without going through the channel.
    pub fn state(&self) -> &LeaderboardState {
        &self.state
    }

    /// Run one full refresh cycle.
    ///
    /// Per cycle, in order: capture the current snapshot's positions as the
    /// candidate history, fetch and decode the metadata feed, fetch and
    /// decode the leaderboard feed (committing the candidate history and
    /// re-sorting on success), then publish. A failed feed leaves the
    /// corresponding published value untouched for this cycle.
    pub async fn tick(&mut self) {
        let candidate = PositionHistory::from_snapshot(&self.state.snapshot);
        let mut failure: Option<String> = None;

        match self.fetch_metadata().await {
            Ok(race) => {
                self.state.race = Some(race);
            }
            Err(e) => {
                warn!(feed = Feed::RaceMetadata.name(), error = %e, "feed refresh failed");
                failure.get_or_insert_with(|| e.to_string());
            }
        }

        match self.fetch_leaderboard().await {
            Ok(snapshot) => {
                self.state.history = candidate;
                self.state.snapshot = snapshot;
            }
            Err(e) => {
                warn!(feed = Feed::Leaderboard.name(), error = %e, "feed refresh failed");
                failure.get_or_insert_with(|| e.to_string());
            }
        }

        if self.state.lifecycle == Lifecycle::Priming {
            if self.state.race.is_some() && !self.state.snapshot.is_empty() {
                self.state.lifecycle = Lifecycle::Live;
                self.state.last_error = None;
                info!(drivers = self.state.snapshot.len(), "leaderboard is live");
            } else {
                self.state.last_error =
                    failure.or_else(|| Some("Race data is not available yet".to_string()));
            }
        }

        self.publish.send_replace(self.state.clone());
    }

    /// Drive the loop: an immediate first cycle, then one per interval,
    /// until `shutdown` fires (or its sender is dropped).
    ///
    /// At most one cycle is ever in flight: a tick that lands while a slow
    /// cycle is still running is dropped rather than queued.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut timer = tokio::time::interval(self.config.interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = timer.tick() => self.tick().await,
                _ = shutdown.changed() => break,
            }
        }

        debug!("refresh loop stopped");
    }

    /// Spawn the loop onto the runtime and return a handle for subscribing
    /// and tearing it down.
    pub fn spawn(self) -> RefreshHandle
    where
        S: 'static,
    {
        let states = self.states();
        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));

        RefreshHandle { states, stop, task }
    }

    async fn fetch_metadata(&self) -> Result<RaceMetadata, FeedError> {
        let text = self.source.fetch(Feed::RaceMetadata).await?;
        let table = Table::parse(&text);
        // Only one race is expected per feed; record 0 wins.
        let row = table.row(0).ok_or(FeedError::EmptyFeed)?;
        RaceMetadata::from_row(&row)
    }

    async fn fetch_leaderboard(&self) -> Result<Vec<DriverStanding>, FeedError> {
        let text = self.source.fetch(Feed::Leaderboard).await?;
        let table = Table::parse(&text);
        if table.is_empty() {
            return Err(FeedError::EmptyFeed);
        }

        let mut snapshot = table
            .rows()
            .map(|row| DriverStanding::from_row(&row, self.config.bool_encoding))
            .collect::<Result<Vec<_>, _>>()?;
        sort_by_position(&mut snapshot);
        Ok(snapshot)
    }
}

/// Handle to a spawned refresh loop.
pub struct RefreshHandle {
    states: watch::Receiver<LeaderboardState>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Subscribe to published states.
    pub fn states(&self) -> watch::Receiver<LeaderboardState> {
        self.states.clone()
    }

    /// Cancel the timer and wait for the loop to finish. An in-flight fetch
    /// completes on its own and its result is discarded.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}
