//! The five statistic groups computed over a [`FilteredDataset`].
//!
//! Each query is a pure function of the dataset. [`StatisticsReport::compute`]
//! runs them side by side on blocking workers; a group that fails keeps its
//! own error and never stops the others.
//!
//! Modes break ties toward the lowest value: months and hours ascending,
//! weekdays Monday first, station names and trips lexicographically.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Month, Weekday};
use serde::Serialize;

use crate::city::weekday_name;
use crate::error::{ExplorerError, Result};
use crate::filter::{FilterCriteria, FilteredDataset};

const MONDAY_FIRST: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Whether an optional column could be reported for this city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Capability<T> {
    Available(T),
    Unavailable,
}

/// The most frequent value of a column and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Popular<T> {
    pub value: T,
    pub count: usize,
}

impl<T> Popular<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Popular<U> {
        Popular {
            value: f(self.value),
            count: self.count,
        }
    }
}

/// Mode of `values`, ties going to the smallest value.
pub fn mode<T: Ord>(values: impl IntoIterator<Item = T>) -> Option<Popular<T>> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }

    let mut best: Option<Popular<T>> = None;
    for (value, count) in counts {
        if best.as_ref().is_none_or(|b| count > b.count) {
            best = Some(Popular { value, count });
        }
    }
    best
}

/// A value and how many trips carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

/// Occurrence counts, most frequent first; equal counts keep first-seen order.
/// Blank values are not counted.
pub fn value_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for v in values {
        if v.trim().is_empty() {
            continue;
        }
        match index.get(v) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(v, counts.len());
                counts.push(CategoryCount {
                    value: v.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// 12-hour clock label: 0 is `12 AM`, 12 is `12 PM`.
pub fn hour_label(hour: u32) -> String {
    match hour {
        0 => "12 AM".to_string(),
        1..=11 => format!("{hour} AM"),
        12 => "12 PM".to_string(),
        h => format!("{} PM", h - 12),
    }
}

/// Most popular times of travel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    pub month: Popular<u32>,
    pub month_name: &'static str,
    pub day_of_week: Popular<Weekday>,
    pub day_name: &'static str,
    pub hour: Popular<u32>,
    pub hour_label: String,
}

#[tracing::instrument(skip_all, fields(trips = dataset.len()))]
pub fn time_stats(dataset: &FilteredDataset) -> Result<TimeStats> {
    let records = dataset.records();
    let empty = || ExplorerError::EmptyDataset("popular travel times");

    let month = mode(records.iter().map(|r| r.month())).ok_or_else(empty)?;
    let day = mode(records.iter().map(|r| r.day_of_week().num_days_from_monday()))
        .ok_or_else(empty)?
        .map(|d| MONDAY_FIRST[d as usize]);
    let hour = mode(records.iter().map(|r| r.hour())).ok_or_else(empty)?;

    let month_name = u8::try_from(month.value)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("Unknown");

    Ok(TimeStats {
        month_name,
        day_name: weekday_name(day.value),
        day_of_week: day,
        hour_label: hour_label(hour.value),
        hour,
        month,
    })
}

/// A start/end station pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TripPair {
    pub start_station: String,
    pub end_station: String,
}

/// Most popular stations and trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationStats {
    pub start_station: Popular<String>,
    pub end_station: Popular<String>,
    pub trip: Popular<TripPair>,
}

#[tracing::instrument(skip_all, fields(trips = dataset.len()))]
pub fn station_stats(dataset: &FilteredDataset) -> Result<StationStats> {
    let records = dataset.records();
    let empty = || ExplorerError::EmptyDataset("popular stations");

    let start = mode(records.iter().map(|r| r.start_station.as_str())).ok_or_else(empty)?;
    let end = mode(records.iter().map(|r| r.end_station.as_str())).ok_or_else(empty)?;
    let trip = mode(
        records
            .iter()
            .map(|r| (r.start_station.as_str(), r.end_station.as_str())),
    )
    .ok_or_else(empty)?;

    Ok(StationStats {
        start_station: start.map(str::to_string),
        end_station: end.map(str::to_string),
        trip: trip.map(|(from, to)| TripPair {
            start_station: from.to_string(),
            end_station: to.to_string(),
        }),
    })
}

/// A whole number of seconds split into hours, minutes, and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hms {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Hms {
    pub fn from_seconds(total: u64) -> Self {
        let (minutes, seconds) = (total / 60, total % 60);
        let (hours, minutes) = (minutes / 60, minutes % 60);
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub fn as_seconds(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

/// Total and mean trip duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub trips: usize,
    pub total_seconds: f64,
    pub mean_seconds: f64,
    /// Total rounded to the nearest second.
    pub total: Hms,
    /// Mean rounded to the nearest second.
    pub mean: Hms,
}

#[tracing::instrument(skip_all, fields(trips = dataset.len()))]
pub fn duration_stats(dataset: &FilteredDataset) -> Result<DurationStats> {
    let records = dataset.records();
    if records.is_empty() {
        return Err(ExplorerError::EmptyDataset("mean trip duration"));
    }

    let total_seconds: f64 = records.iter().map(|r| r.duration_seconds).sum();
    let mean_seconds = total_seconds / records.len() as f64;

    Ok(DurationStats {
        trips: records.len(),
        total_seconds,
        mean_seconds,
        total: Hms::from_seconds(total_seconds.round() as u64),
        mean: Hms::from_seconds(mean_seconds.round() as u64),
    })
}

/// Trips per user type, most frequent first.
#[tracing::instrument(skip_all, fields(trips = dataset.len()))]
pub fn user_type_counts(dataset: &FilteredDataset) -> Vec<CategoryCount> {
    value_counts(dataset.records().iter().map(|r| r.user_type.as_str()))
}

/// Earliest, most recent, and most common year of birth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub most_recent: i32,
    pub most_common: i32,
}

/// Gender and birth year breakdowns, where the city records them.
///
/// `birth_year` is `Available(None)` when the column exists but none of the
/// selected trips carry a year; gender counts are reported regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemographicStats {
    pub gender: Capability<Vec<CategoryCount>>,
    pub birth_year: Capability<Option<BirthYearStats>>,
}

fn birth_year_stats(years: &[i32]) -> Option<BirthYearStats> {
    Some(BirthYearStats {
        earliest: years.iter().copied().min()?,
        most_recent: years.iter().copied().max()?,
        most_common: mode(years.iter().copied())?.value,
    })
}

#[tracing::instrument(skip_all, fields(trips = dataset.len()))]
pub fn demographic_stats(dataset: &FilteredDataset) -> DemographicStats {
    let caps = dataset.capabilities();
    let records = dataset.records();

    let gender = if caps.has_gender {
        Capability::Available(value_counts(records.iter().filter_map(|r| r.gender.as_deref())))
    } else {
        Capability::Unavailable
    };

    let birth_year = if caps.has_birth_year {
        let years: Vec<i32> = records.iter().filter_map(|r| r.birth_year).collect();
        Capability::Available(birth_year_stats(&years))
    } else {
        Capability::Unavailable
    };

    DemographicStats { gender, birth_year }
}

/// All five statistic groups for one dataset.
#[derive(Debug)]
pub struct StatisticsReport {
    pub criteria: FilterCriteria,
    pub trips: usize,
    pub time: Result<TimeStats>,
    pub stations: Result<StationStats>,
    pub durations: Result<DurationStats>,
    pub user_types: Vec<CategoryCount>,
    pub demographics: DemographicStats,
}

impl StatisticsReport {
    /// Runs the five queries one after another on the current thread.
    pub fn from_dataset(dataset: &FilteredDataset) -> Self {
        Self {
            criteria: dataset.criteria(),
            trips: dataset.len(),
            time: time_stats(dataset),
            stations: station_stats(dataset),
            durations: duration_stats(dataset),
            user_types: user_type_counts(dataset),
            demographics: demographic_stats(dataset),
        }
    }

    /// Runs the five queries concurrently on blocking workers.
    ///
    /// # Errors
    ///
    /// Only fails if a worker panics; query errors stay in their group.
    #[tracing::instrument(skip_all, fields(trips = dataset.len()))]
    pub async fn compute(dataset: Arc<FilteredDataset>) -> anyhow::Result<Self> {
        let (time, stations, durations, user_types, demographics) = tokio::try_join!(
            spawn_query(&dataset, time_stats),
            spawn_query(&dataset, station_stats),
            spawn_query(&dataset, duration_stats),
            spawn_query(&dataset, user_type_counts),
            spawn_query(&dataset, demographic_stats),
        )?;

        Ok(Self {
            criteria: dataset.criteria(),
            trips: dataset.len(),
            time,
            stations,
            durations,
            user_types,
            demographics,
        })
    }
}

fn spawn_query<T, F>(dataset: &Arc<FilteredDataset>, query: F) -> tokio::task::JoinHandle<T>
where
    T: Send + 'static,
    F: FnOnce(&FilteredDataset) -> T + Send + 'static,
{
    let dataset = Arc::clone(dataset);
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(|| query(&dataset)))
}

#[derive(Serialize)]
#[serde(untagged)]
enum Outcome<'a, T> {
    Ok(&'a T),
    Err { error: String },
}

impl<'a, T> From<&'a Result<T>> for Outcome<'a, T> {
    fn from(r: &'a Result<T>) -> Self {
        match r {
            Ok(v) => Outcome::Ok(v),
            Err(e) => Outcome::Err {
                error: e.to_string(),
            },
        }
    }
}

impl Serialize for StatisticsReport {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut st = s.serialize_struct("StatisticsReport", 7)?;
        st.serialize_field("criteria", &self.criteria)?;
        st.serialize_field("trips", &self.trips)?;
        st.serialize_field("time", &Outcome::from(&self.time))?;
        st.serialize_field("stations", &Outcome::from(&self.stations))?;
        st.serialize_field("durations", &Outcome::from(&self.durations))?;
        st.serialize_field("user_types", &self.user_types)?;
        st.serialize_field("demographics", &self.demographics)?;
        st.end()
    }
}
