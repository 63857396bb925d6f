//! Trip records and the per-city store they are loaded into.
//!
//! A [`TripStore`] is built once per city from a delimited source with a
//! header row. Calendar fields are derived from `Start Time` while loading and
//! the optional `Gender` / `Birth Year` columns are detected from the header.

use std::io::Read;

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Weekday};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info};

use crate::city::{City, weekday_name};
use crate::error::{ExplorerError, Result};
use crate::source::CityResolver;

pub const START_TIME: &str = "Start Time";
pub const END_TIME: &str = "End Time";
pub const START_STATION: &str = "Start Station";
pub const END_STATION: &str = "End Station";
pub const TRIP_DURATION: &str = "Trip Duration";
pub const USER_TYPE: &str = "User Type";
pub const GENDER: &str = "Gender";
pub const BIRTH_YEAR: &str = "Birth Year";

const REQUIRED_COLUMNS: [&str; 5] = [
    START_TIME,
    START_STATION,
    END_STATION,
    TRIP_DURATION,
    USER_TYPE,
];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses a start or end time as written by the published trip datasets.
///
/// Offsets are accepted but dropped: the wall-clock time is kept as is.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

/// One ride.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRecord {
    start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub start_station: String,
    pub end_station: String,
    pub duration_seconds: f64,
    pub user_type: String,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,

    // derived from start_time
    month: u32,
    #[serde(serialize_with = "serialize_weekday")]
    day_of_week: Weekday,
    hour: u32,
}

fn serialize_weekday<S: Serializer>(day: &Weekday, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(weekday_name(*day))
}

impl TripRecord {
    pub fn new(
        start_time: NaiveDateTime,
        start_station: impl Into<String>,
        end_station: impl Into<String>,
        duration_seconds: f64,
        user_type: impl Into<String>,
    ) -> Self {
        Self {
            start_time,
            end_time: None,
            start_station: start_station.into(),
            end_station: end_station.into(),
            duration_seconds,
            user_type: user_type.into(),
            gender: None,
            birth_year: None,
            month: start_time.month(),
            day_of_week: start_time.weekday(),
            hour: start_time.hour(),
        }
    }

    pub fn with_end_time(mut self, end_time: NaiveDateTime) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_birth_year(mut self, birth_year: i32) -> Self {
        self.birth_year = Some(birth_year);
        self
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    /// Replaces the start time and recomputes the calendar fields with it.
    pub fn set_start_time(&mut self, start_time: NaiveDateTime) {
        self.start_time = start_time;
        self.month = start_time.month();
        self.day_of_week = start_time.weekday();
        self.hour = start_time.hour();
    }

    /// Calendar month of the start time, 1-12.
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day_of_week(&self) -> Weekday {
        self.day_of_week
    }

    /// Hour of the start time, 0-23.
    pub fn hour(&self) -> u32 {
        self.hour
    }
}

/// A row as it appears in the source, before validation.
#[derive(Debug, Deserialize)]
struct RawTrip {
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "End Time", default)]
    end_time: Option<String>,
    #[serde(rename = "Start Station")]
    start_station: String,
    #[serde(rename = "End Station")]
    end_station: String,
    #[serde(rename = "Trip Duration")]
    trip_duration: f64,
    #[serde(rename = "User Type")]
    user_type: String,
    #[serde(rename = "Gender", default)]
    gender: Option<String>,
    // written as 1989.0 by the published datasets
    #[serde(rename = "Birth Year", default)]
    birth_year: Option<f64>,
}

impl RawTrip {
    fn into_record(self, line: u64) -> Result<TripRecord> {
        let start_time = parse_timestamp(&self.start_time).ok_or_else(|| {
            let reason = format!("unparseable {START_TIME} '{}'", self.start_time);
            ExplorerError::malformed(line, reason)
        })?;

        let end_time = match self.end_time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
                ExplorerError::malformed(line, format!("unparseable {END_TIME} '{raw}'"))
            })?),
        };

        if !self.trip_duration.is_finite() || self.trip_duration < 0.0 {
            return Err(ExplorerError::malformed(
                line,
                format!(
                    "{TRIP_DURATION} must be a non-negative number of seconds, got {}",
                    self.trip_duration
                ),
            ));
        }

        let birth_year = match self.birth_year {
            Some(year) if year.is_finite() && year.fract() == 0.0 => Some(year as i32),
            Some(year) => {
                return Err(ExplorerError::malformed(
                    line,
                    format!("{BIRTH_YEAR} must be a whole year, got {year}"),
                ));
            }
            None => None,
        };

        let mut record = TripRecord::new(
            start_time,
            self.start_station,
            self.end_station,
            self.trip_duration,
            self.user_type.trim(),
        );
        record.end_time = end_time;
        record.gender = self
            .gender
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());
        record.birth_year = birth_year;

        Ok(record)
    }
}

/// Which optional columns a city's source carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub has_gender: bool,
    pub has_birth_year: bool,
}

/// Every trip of one city, in source order.
#[derive(Debug, Clone)]
pub struct TripStore {
    city: City,
    records: Vec<TripRecord>,
    capabilities: Capabilities,
}

impl TripStore {
    /// Fetches the city's source through `resolver` and parses it.
    #[tracing::instrument(skip(resolver), fields(city = %city))]
    pub async fn load<R: CityResolver + ?Sized>(resolver: &R, city: City) -> Result<Self> {
        let bytes = resolver.fetch(city).await?;
        debug!(bytes = bytes.len(), "Source bytes received");

        if is_gzip(&bytes) {
            let mut decoded = Vec::new();
            GzDecoder::new(bytes.as_slice())
                .read_to_end(&mut decoded)
                .map_err(|e| ExplorerError::unavailable(city, format!("gzip decode failed: {e}")))?;
            Self::from_reader(city, decoded.as_slice())
        } else {
            Self::from_reader(city, bytes.as_slice())
        }
    }

    /// Parses a delimited source with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::MalformedRow`] for a missing required column or
    /// the first row whose required fields do not parse. No rows are skipped.
    pub fn from_reader<R: Read>(city: City, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| ExplorerError::malformed(1, format!("unreadable header row: {e}")))?
            .clone();

        let has_column = |name: &str| headers.iter().any(|h| h.trim() == name);

        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !has_column(c)) {
            return Err(ExplorerError::malformed(1, format!("missing required column '{missing}'")));
        }

        let capabilities = Capabilities {
            has_gender: has_column(GENDER),
            has_birth_year: has_column(BIRTH_YEAR),
        };

        let headers = trimmed(&headers);
        let mut records = Vec::new();

        for result in rdr.records() {
            let row = result.map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                ExplorerError::malformed(line, e)
            })?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);

            let raw: RawTrip = row
                .deserialize(Some(&headers))
                .map_err(|e| ExplorerError::malformed(line, e))?;

            records.push(raw.into_record(line)?);
        }

        info!(
            city = %city,
            rows = records.len(),
            has_gender = capabilities.has_gender,
            has_birth_year = capabilities.has_birth_year,
            "Trip data loaded"
        );

        Ok(Self {
            city,
            records,
            capabilities,
        })
    }

    /// Builds a store from records already in memory.
    pub fn from_records(city: City, records: Vec<TripRecord>, capabilities: Capabilities) -> Self {
        Self {
            city,
            records,
            capabilities,
        }
    }

    pub fn city(&self) -> City {
        self.city
    }

    pub fn records(&self) -> &[TripRecord] {
        &self.records
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn has_gender(&self) -> bool {
        self.capabilities.has_gender
    }

    pub fn has_birth_year(&self) -> bool {
        self.capabilities.has_birth_year
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x1f, 0x8b])
}

fn trimmed(headers: &csv::StringRecord) -> csv::StringRecord {
    headers.iter().map(str::trim).collect()
}
