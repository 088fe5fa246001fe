//! Typed feed records
//!
//! The feeds carry everything as strings; this module decodes each record
//! into a fixed type with named fields instead of an open-ended string map.
//! Decoding is forgiving about absent columns and blank values (they
//! default), but a non-blank value that fails to parse as its declared type
//! is an error — a half-garbled feed should fail the cycle rather than
//! publish nonsense positions.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::csv::Row;
use crate::feed::FeedError;

/// Track flag as coded by the metadata feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagState {
    /// Code `"1"`
    Green,
    /// Code `"2"`
    Yellow,
    /// Code `"3"`
    Red,
    /// Code `"4"`
    Checkered,
    /// Any other code. The feed has sent unknown codes before; they mean
    /// "race under way" rather than an error.
    Racing,
}

impl FlagState {
    /// Decode a feed flag code. Unknown codes map to [`FlagState::Racing`].
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => FlagState::Green,
            "2" => FlagState::Yellow,
            "3" => FlagState::Red,
            "4" => FlagState::Checkered,
            _ => FlagState::Racing,
        }
    }

    /// Text shown next to the flag indicator.
    pub fn display_name(&self) -> &'static str {
        match self {
            FlagState::Green => "Green Flag",
            FlagState::Yellow => "Yellow Flag",
            FlagState::Red => "Red Flag",
            FlagState::Checkered => "Checkered Flag",
            FlagState::Racing => "Racing",
        }
    }
}

/// Encoding of the boolean-like feed fields (`is_on_track`, `is_on_dvp`).
///
/// Current exports write upper-case `TRUE`/`FALSE`; older sheets wrote
/// title-case `True`/`False`. The two conventions are incompatible and a
/// deployment uses exactly one of them — [`BoolEncoding::Title`] is the
/// compatibility shim for the old sheets, not a fallback that is always
/// consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoolEncoding {
    /// `TRUE` / `FALSE` (canonical)
    #[default]
    Upper,
    /// `True` / `False` (legacy sheets)
    Title,
}

impl BoolEncoding {
    /// The literal this encoding uses for true.
    pub fn true_literal(&self) -> &'static str {
        match self {
            BoolEncoding::Upper => "TRUE",
            BoolEncoding::Title => "True",
        }
    }

    /// Decode a raw field. Anything other than the exact true literal is
    /// false, matching how the display has always read these fields.
    pub fn decode(&self, raw: &str) -> bool {
        raw == self.true_literal()
    }
}

/// One record describing overall race state. Fully replaced each refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceMetadata {
    /// Decoded track flag
    pub flag_state: FlagState,
    /// Current lap
    pub lap_number: u32,
    /// Scheduled race length in laps
    pub laps_in_race: u32,
    /// Event name, e.g. "Test 500"
    pub run_name: String,
    /// Series identifier
    pub series_id: String,
    /// Track name
    pub track_name: String,
    /// Raw `time_of_day_os` value; see [`RaceMetadata::time_of_day_utc`]
    pub time_of_day: String,
    /// Race identifier (only some feed versions send it)
    pub race_id: Option<String>,
    /// Run identifier (only some feed versions send it)
    pub run_id: Option<String>,
    /// Track identifier (only some feed versions send it)
    pub track_id: Option<String>,
}

impl RaceMetadata {
    /// Decode one metadata record.
    pub fn from_row(row: &Row<'_>) -> Result<Self, FeedError> {
        Ok(Self {
            flag_state: FlagState::from_code(row.get("flag_state")),
            lap_number: u32_field(row, "lap_number")?,
            laps_in_race: u32_field(row, "laps_in_race")?,
            run_name: row.get("run_name").to_string(),
            series_id: row.get("series_id").to_string(),
            track_name: row.get("track_name").to_string(),
            time_of_day: row.get("time_of_day_os").to_string(),
            race_id: optional_field(row, "race_id"),
            run_id: optional_field(row, "run_id"),
            track_id: optional_field(row, "track_id"),
        })
    }

    /// Decode `time_of_day_os` as a UTC timestamp.
    ///
    /// The feed has sent both epoch milliseconds (all digits) and RFC 3339
    /// strings; anything else yields `None`.
    pub fn time_of_day_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.time_of_day.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            let millis: i64 = raw.parse().ok()?;
            return Utc.timestamp_millis_opt(millis).single();
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// One record per competitor in the leaderboard feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverStanding {
    /// Stable driver key, used to match positions across snapshots
    pub driver_id: String,
    /// Running position (1-based rank within the snapshot)
    pub running_position: u32,
    /// Position the driver started the race from
    pub starting_position: u32,
    /// Car number as printed on the vehicle
    pub vehicle_number: String,
    /// Manufacturer code, e.g. "Chv", "Frd", "Toy"
    pub vehicle_manufacturer: String,
    /// Driver name
    pub full_name: String,
    /// Last lap time in seconds
    pub last_lap_time: f64,
    /// Raw signed gap to the leader: 0 = leader, positive = seconds behind,
    /// negative = lapped-driver sentinel (see [`DeltaConvention`])
    pub delta: f64,
    /// Whether the car is currently on track
    pub is_on_track: bool,
    /// Whether the car is running under the damaged-vehicle policy
    pub is_on_dvp: bool,
}

impl DriverStanding {
    /// Decode one leaderboard record.
    ///
    /// `driver_id` and `running_position` are the snapshot key and sort
    /// order, so those columns must exist and the position must parse;
    /// everything else defaults when absent or blank.
    pub fn from_row(row: &Row<'_>, booleans: BoolEncoding) -> Result<Self, FeedError> {
        let driver_id = row
            .try_get("driver_id")
            .ok_or(FeedError::MissingColumn("driver_id"))?;
        let raw_position = row
            .try_get("running_position")
            .ok_or(FeedError::MissingColumn("running_position"))?;
        let running_position = raw_position.parse().map_err(|_| FeedError::InvalidField {
            column: "running_position",
            value: raw_position.to_string(),
        })?;

        Ok(Self {
            driver_id: driver_id.to_string(),
            running_position,
            starting_position: u32_field(row, "starting_position")?,
            vehicle_number: row.get("vehicle_number").to_string(),
            vehicle_manufacturer: row.get("vehicle_manufacturer").to_string(),
            full_name: row.get("full_name").to_string(),
            last_lap_time: f64_field(row, "last_lap_time")?,
            delta: f64_field(row, "delta")?,
            is_on_track: booleans.decode(row.get("is_on_track")),
            is_on_dvp: booleans.decode(row.get("is_on_dvp")),
        })
    }

    /// Classify this driver's gap to the leader.
    pub fn delta_class(&self) -> DeltaClass {
        DeltaClass::from_delta(self.delta)
    }
}

/// Presentation category of the raw delta field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaClass {
    /// Delta is exactly zero
    Leader,
    /// Positive delta: seconds behind the leader
    Behind,
    /// Negative delta: the lapped-driver sentinel
    Lapped,
}

impl DeltaClass {
    /// Classify a raw delta value.
    pub fn from_delta(delta: f64) -> Self {
        if delta == 0.0 {
            DeltaClass::Leader
        } else if delta > 0.0 {
            DeltaClass::Behind
        } else {
            DeltaClass::Lapped
        }
    }
}

/// How a negative delta is rendered.
///
/// Two incompatible conventions exist across feed versions. The core keeps
/// the raw signed delta and the display picks a convention explicitly; there
/// is no authoritative answer baked in here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaConvention {
    /// Negative delta is a gap in seconds ahead of the leader
    #[default]
    SecondsGap,
    /// Negative delta is a whole number of laps down
    LapsDown,
}

/// Format a raw delta for display under the given convention.
pub fn format_delta(delta: f64, convention: DeltaConvention) -> String {
    if delta == 0.0 {
        return "Leader".to_string();
    }
    if delta > 0.0 {
        return format!("+{:.1}", delta);
    }
    match convention {
        DeltaConvention::SecondsGap => format!("{:.1}", delta),
        DeltaConvention::LapsDown => format!("-{} lap", delta.abs().round() as i64),
    }
}

/// Format a lap time for display (three decimal places).
pub fn format_lap_time(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

fn u32_field(row: &Row<'_>, column: &'static str) -> Result<u32, FeedError> {
    let raw = row.get(column);
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|_| FeedError::InvalidField {
        column,
        value: raw.to_string(),
    })
}

fn f64_field(row: &Row<'_>, column: &'static str) -> Result<f64, FeedError> {
    let raw = row.get(column);
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse().map_err(|_| FeedError::InvalidField {
        column,
        value: raw.to_string(),
    })
}

fn optional_field(row: &Row<'_>, column: &str) -> Option<String> {
    row.try_get(column)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::Table;

    #[test]
    fn test_flag_codes() {
        assert_eq!(FlagState::from_code("1"), FlagState::Green);
        assert_eq!(FlagState::from_code("2"), FlagState::Yellow);
        assert_eq!(FlagState::from_code("3"), FlagState::Red);
        assert_eq!(FlagState::from_code("4"), FlagState::Checkered);
        // Default-on-unknown, not an error
        assert_eq!(FlagState::from_code("7"), FlagState::Racing);
        assert_eq!(FlagState::from_code(""), FlagState::Racing);
        assert_eq!(FlagState::from_code("2").display_name(), "Yellow Flag");
    }

    #[test]
    fn test_bool_encodings_are_exclusive() {
        assert!(BoolEncoding::Upper.decode("TRUE"));
        assert!(!BoolEncoding::Upper.decode("True"));
        assert!(!BoolEncoding::Upper.decode("FALSE"));
        assert!(BoolEncoding::Title.decode("True"));
        assert!(!BoolEncoding::Title.decode("TRUE"));
    }

    #[test]
    fn test_metadata_defaults_missing_columns() {
        let table = Table::parse("flag_state,run_name\n2,Test 500");
        let meta = RaceMetadata::from_row(&table.row(0).unwrap()).unwrap();
        assert_eq!(meta.flag_state, FlagState::Yellow);
        assert_eq!(meta.run_name, "Test 500");
        assert_eq!(meta.lap_number, 0);
        assert_eq!(meta.laps_in_race, 0);
        assert_eq!(meta.race_id, None);
    }

    #[test]
    fn test_metadata_rejects_garbled_numbers() {
        let table = Table::parse("flag_state,lap_number\n1,abc");
        let err = RaceMetadata::from_row(&table.row(0).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            FeedError::InvalidField {
                column: "lap_number",
                ..
            }
        ));
    }

    #[test]
    fn test_time_of_day_epoch_millis_and_rfc3339() {
        let mut meta =
            RaceMetadata::from_row(&Table::parse("flag_state\n1").row(0).unwrap()).unwrap();

        meta.time_of_day = "1700000000000".to_string();
        let ts = meta.time_of_day_utc().unwrap();
        assert_eq!(ts.timestamp_millis(), 1_700_000_000_000);

        meta.time_of_day = "2024-05-26T18:30:00Z".to_string();
        assert!(meta.time_of_day_utc().is_some());

        meta.time_of_day = "afternoon".to_string();
        assert!(meta.time_of_day_utc().is_none());
    }

    #[test]
    fn test_standing_requires_key_and_position() {
        let table = Table::parse("driver_id,full_name\n7,Somebody");
        let err =
            DriverStanding::from_row(&table.row(0).unwrap(), BoolEncoding::Upper).unwrap_err();
        assert!(matches!(err, FeedError::MissingColumn("running_position")));
    }

    #[test]
    fn test_standing_decodes_full_record() {
        let table = Table::parse(
            "driver_id,running_position,starting_position,vehicle_number,vehicle_manufacturer,\
             full_name,last_lap_time,delta,is_on_track,is_on_dvp\n\
             3833,1,4,11,Toy,Denny Hamlin,29.457,0,TRUE,FALSE",
        );
        let d = DriverStanding::from_row(&table.row(0).unwrap(), BoolEncoding::Upper).unwrap();
        assert_eq!(d.driver_id, "3833");
        assert_eq!(d.running_position, 1);
        assert_eq!(d.starting_position, 4);
        assert_eq!(d.full_name, "Denny Hamlin");
        assert_eq!(d.last_lap_time, 29.457);
        assert_eq!(d.delta_class(), DeltaClass::Leader);
        assert!(d.is_on_track);
        assert!(!d.is_on_dvp);
    }

    #[test]
    fn test_delta_classification() {
        assert_eq!(DeltaClass::from_delta(0.0), DeltaClass::Leader);
        assert_eq!(DeltaClass::from_delta(3.2), DeltaClass::Behind);
        assert_eq!(DeltaClass::from_delta(-2.0), DeltaClass::Lapped);
    }

    #[test]
    fn test_delta_formatting_conventions() {
        assert_eq!(format_delta(0.0, DeltaConvention::SecondsGap), "Leader");
        assert_eq!(format_delta(0.0, DeltaConvention::LapsDown), "Leader");
        assert_eq!(format_delta(1.25, DeltaConvention::SecondsGap), "+1.2");
        assert_eq!(format_delta(1.25, DeltaConvention::LapsDown), "+1.2");
        assert_eq!(format_delta(-0.8, DeltaConvention::SecondsGap), "-0.8");
        assert_eq!(format_delta(-2.0, DeltaConvention::LapsDown), "-2 lap");
    }

    #[test]
    fn test_lap_time_formatting() {
        assert_eq!(format_lap_time(29.4571), "29.457");
        assert_eq!(format_lap_time(29.0), "29.000");
    }
}
