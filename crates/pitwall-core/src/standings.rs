//! Position-change tracking
//!
//! The feed only carries each driver's current running position; the
//! up/down movement shown next to it is derived here by comparing against
//! the previous snapshot's positions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::DriverStanding;

/// Signed position change against the previous snapshot.
///
/// Positive means the driver moved toward the front. Note the sign: the
/// change is `previous - current`, not `current - previous` — gaining two
/// places from P5 to P3 is `+2`.
pub fn position_change(current: u32, previous: Option<u32>) -> i32 {
    match previous {
        Some(prev) => prev as i32 - current as i32,
        None => 0,
    }
}

/// A driver's movement relative to the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionChange {
    /// No previous position on record: first snapshot, or the driver just
    /// appeared in the feed. Distinct from `Moved(0)` so a display can
    /// badge new entrants if it wants to.
    New,
    /// Signed movement; positive = gained places.
    Moved(i32),
}

impl PositionChange {
    /// Collapse to the signed value used by the classic display, where a
    /// first sighting counts as no movement.
    pub fn signed(self) -> i32 {
        match self {
            PositionChange::New => 0,
            PositionChange::Moved(delta) => delta,
        }
    }

    /// Presentation category of this change.
    pub fn trend(self) -> Trend {
        Trend::from_signed(self.signed())
    }
}

/// Presentation category of a signed position change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// Gained places since the previous snapshot
    Improved,
    /// Lost places since the previous snapshot
    Worsened,
    /// Held position (or first sighting)
    Unchanged,
}

impl Trend {
    /// Classify a signed change.
    pub fn from_signed(change: i32) -> Self {
        if change > 0 {
            Trend::Improved
        } else if change < 0 {
            Trend::Worsened
        } else {
            Trend::Unchanged
        }
    }
}

/// Running positions from the previous successfully parsed snapshot,
/// keyed by driver id.
///
/// Lives only in process memory; restarting the process resets it, so the
/// first snapshot after a restart shows every driver as unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionHistory {
    positions: HashMap<String, u32>,
}

impl PositionHistory {
    /// An empty history (no snapshot seen yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the positions of a snapshot.
    pub fn from_snapshot(snapshot: &[DriverStanding]) -> Self {
        Self {
            positions: snapshot
                .iter()
                .map(|d| (d.driver_id.clone(), d.running_position))
                .collect(),
        }
    }

    /// Previous running position for a driver, if known.
    pub fn previous_position(&self, driver_id: &str) -> Option<u32> {
        self.positions.get(driver_id).copied()
    }

    /// Movement of a driver now running at `current`.
    pub fn change(&self, driver_id: &str, current: u32) -> PositionChange {
        match self.previous_position(driver_id) {
            Some(prev) => PositionChange::Moved(prev as i32 - current as i32),
            None => PositionChange::New,
        }
    }

    /// Number of drivers on record.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when no snapshot has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Sort a snapshot ascending by running position.
///
/// The feed claims positions are a dense 1..N permutation but does not
/// enforce it; gaps or duplicates are tolerated here (stable sort) rather
/// than rejected, matching what the display has always done.
pub fn sort_by_position(snapshot: &mut [DriverStanding]) {
    snapshot.sort_by_key(|d| d.running_position);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing(driver_id: &str, running_position: u32) -> DriverStanding {
        DriverStanding {
            driver_id: driver_id.to_string(),
            running_position,
            starting_position: 0,
            vehicle_number: String::new(),
            vehicle_manufacturer: String::new(),
            full_name: String::new(),
            last_lap_time: 0.0,
            delta: 0.0,
            is_on_track: true,
            is_on_dvp: false,
        }
    }

    #[test]
    fn test_position_change_sign_convention() {
        // Gained two spots
        assert_eq!(position_change(3, Some(5)), 2);
        // Lost two spots
        assert_eq!(position_change(5, Some(3)), -2);
        assert_eq!(position_change(4, Some(4)), 0);
        // First sighting counts as no change
        assert_eq!(position_change(7, None), 0);
    }

    #[test]
    fn test_history_change_is_tri_state() {
        let history = PositionHistory::from_snapshot(&[standing("a", 5), standing("b", 2)]);
        assert_eq!(history.change("a", 3), PositionChange::Moved(2));
        assert_eq!(history.change("b", 2), PositionChange::Moved(0));
        assert_eq!(history.change("c", 1), PositionChange::New);
        assert_eq!(history.change("c", 1).signed(), 0);
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(PositionChange::Moved(2).trend(), Trend::Improved);
        assert_eq!(PositionChange::Moved(-1).trend(), Trend::Worsened);
        assert_eq!(PositionChange::Moved(0).trend(), Trend::Unchanged);
        assert_eq!(PositionChange::New.trend(), Trend::Unchanged);
    }

    #[test]
    fn test_sort_ascending_by_position() {
        let mut snapshot = vec![standing("a", 3), standing("b", 1), standing("c", 2)];
        sort_by_position(&mut snapshot);
        let order: Vec<u32> = snapshot.iter().map(|d| d.running_position).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_tolerates_duplicates_and_gaps() {
        let mut snapshot = vec![standing("a", 9), standing("b", 2), standing("c", 2)];
        sort_by_position(&mut snapshot);
        assert_eq!(snapshot[0].running_position, 2);
        assert_eq!(snapshot[2].running_position, 9);
        // Stable: equal positions keep feed order
        assert_eq!(snapshot[0].driver_id, "b");
        assert_eq!(snapshot[1].driver_id, "c");
    }
}
