//! Demo Mode - simulated live feeds for running without a network
//!
//! Serves the same CSV shape as the real endpoints, so the whole pipeline
//! (parser included) is exercised end to end. The race advances one lap per
//! leaderboard fetch: mostly green flag with occasional cautions, a few
//! adjacent position swaps, lap times around a track base time and
//! cumulative gaps behind the leader.

use std::fmt::Write as _;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::feed::{Feed, FeedError, FeedSource};

/// Demo field: driver id, car number, manufacturer code, name.
const ROSTER: &[(u32, &str, &str, &str)] = &[
    (3832, "71", "Chv", "Michael McDowell"),
    (3833, "11", "Toy", "Denny Hamlin"),
    (3834, "5", "Chv", "Kyle Larson"),
    (3835, "9", "Chv", "Chase Elliott"),
    (3836, "19", "Toy", "Martin Truex Jr."),
    (3837, "8", "Chv", "Kyle Busch"),
    (3838, "24", "Chv", "William Byron"),
    (3839, "20", "Toy", "Christopher Bell"),
    (3840, "48", "Chv", "Alex Bowman"),
    (3843, "12", "Frd", "Ryan Blaney"),
    (3844, "22", "Frd", "Joey Logano"),
    (3845, "6", "Frd", "Brad Keselowski"),
];

/// Base lap time for the simulated track (an intermediate oval), seconds.
const BASE_LAP_TIME: f64 = 28.0;

struct DemoRace {
    rng: StdRng,
    lap: u32,
    laps_in_race: u32,
    /// Feed flag code for the current lap
    flag: u8,
    /// Roster index by running position
    order: Vec<usize>,
    /// Starting position per roster index
    starting: Vec<u32>,
}

impl DemoRace {
    fn new(mut rng: StdRng) -> Self {
        let mut order: Vec<usize> = (0..ROSTER.len()).collect();
        // Shuffle the starting grid
        for i in (1..order.len()).rev() {
            let j = rng.gen_range(0..=i);
            order.swap(i, j);
        }
        let mut starting = vec![0u32; ROSTER.len()];
        for (pos, &idx) in order.iter().enumerate() {
            starting[idx] = pos as u32 + 1;
        }

        Self {
            rng,
            lap: 1,
            laps_in_race: 75,
            flag: 1,
            order,
            starting,
        }
    }

    /// Advance one lap: update the flag and swap a few adjacent positions.
    fn advance(&mut self) {
        if self.lap < self.laps_in_race {
            self.lap += 1;
            // Mostly green, sometimes caution
            self.flag = if self.rng.gen_range(0..4) == 0 { 2 } else { 1 };
        } else {
            self.flag = 4;
        }

        let swaps = self.rng.gen_range(0..3);
        for _ in 0..swaps {
            let i = self.rng.gen_range(1..self.order.len());
            self.order.swap(i - 1, i);
        }
    }

    fn metadata_csv(&self) -> String {
        let mut csv = String::from(
            "flag_state,lap_number,laps_in_race,run_name,series_id,track_name,time_of_day_os\n",
        );
        let _ = writeln!(
            csv,
            "{},{},{},Demo 500,1,Demo International Speedway,{}",
            self.flag,
            self.lap,
            self.laps_in_race,
            Utc::now().timestamp_millis(),
        );
        csv
    }

    fn leaderboard_csv(&mut self) -> String {
        let mut csv = String::from(
            "driver_id,running_position,starting_position,vehicle_number,vehicle_manufacturer,\
             full_name,last_lap_time,delta,is_on_track,is_on_dvp\n",
        );

        let mut gap = 0.0;
        for (pos, &idx) in self.order.iter().enumerate() {
            let (id, number, manufacturer, name) = ROSTER[idx];
            let lap_time = BASE_LAP_TIME + self.rng.gen_range(-2.0..3.0);
            let delta = if pos == 0 {
                0.0
            } else if pos == self.order.len() - 1 && self.rng.gen_bool(0.3) {
                // Tail of the field occasionally goes a lap down
                -1.0
            } else {
                gap += self.rng.gen_range(0.1..1.5);
                gap
            };
            let on_track = !(self.flag == 2 && self.rng.gen_bool(0.1));
            let on_dvp = self.rng.gen_bool(0.04);

            let _ = writeln!(
                csv,
                "{},{},{},{},{},{},{:.3},{:.1},{},{}",
                id,
                pos + 1,
                self.starting[idx],
                number,
                manufacturer,
                name,
                lap_time,
                delta,
                if on_track { "TRUE" } else { "FALSE" },
                if on_dvp { "TRUE" } else { "FALSE" },
            );
        }

        csv
    }
}

/// A [`FeedSource`] backed by the simulated race instead of the network.
pub struct DemoFeed {
    race: Mutex<DemoRace>,
}

impl DemoFeed {
    /// Create a simulator with a random starting grid.
    pub fn new() -> Self {
        Self {
            race: Mutex::new(DemoRace::new(StdRng::from_entropy())),
        }
    }

    /// Create a simulator with a fixed seed (reproducible runs).
    pub fn seeded(seed: u64) -> Self {
        Self {
            race: Mutex::new(DemoRace::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Default for DemoFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedSource for DemoFeed {
    async fn fetch(&self, feed: Feed) -> Result<String, FeedError> {
        let mut race = self.race.lock().unwrap();
        Ok(match feed {
            Feed::RaceMetadata => race.metadata_csv(),
            Feed::Leaderboard => {
                race.advance();
                race.leaderboard_csv()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::Table;
    use crate::model::{BoolEncoding, DriverStanding, RaceMetadata};

    #[tokio::test]
    async fn test_demo_feeds_decode_like_real_ones() {
        let feed = DemoFeed::seeded(42);

        let meta_text = feed.fetch(Feed::RaceMetadata).await.unwrap();
        let meta_table = Table::parse(&meta_text);
        let meta = RaceMetadata::from_row(&meta_table.row(0).unwrap()).unwrap();
        assert_eq!(meta.run_name, "Demo 500");
        assert_eq!(meta.laps_in_race, 75);
        assert!(meta.time_of_day_utc().is_some());

        let lb_text = feed.fetch(Feed::Leaderboard).await.unwrap();
        let table = Table::parse(&lb_text);
        assert_eq!(table.len(), ROSTER.len());
        let standings: Vec<DriverStanding> = table
            .rows()
            .map(|row| DriverStanding::from_row(&row, BoolEncoding::Upper).unwrap())
            .collect();

        // Positions are a dense 1..N permutation
        let mut positions: Vec<u32> = standings.iter().map(|d| d.running_position).collect();
        positions.sort_unstable();
        assert_eq!(positions, (1..=ROSTER.len() as u32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_demo_race_advances_per_leaderboard_fetch() {
        let feed = DemoFeed::seeded(7);
        let _ = feed.fetch(Feed::Leaderboard).await.unwrap();
        let meta_text = feed.fetch(Feed::RaceMetadata).await.unwrap();
        let meta =
            RaceMetadata::from_row(&Table::parse(&meta_text).row(0).unwrap()).unwrap();
        assert_eq!(meta.lap_number, 2);
    }
}
