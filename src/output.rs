//! Presentation of statistics and raw rows.
//!
//! Supports plain-text rendering (via `Display`), JSON serialization, and CSV
//! export of a filtered dataset.

use std::fmt;
use std::fs::File;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::browse::Page;
use crate::error::ExplorerError;
use crate::filter::FilteredDataset;
use crate::stats::{
    BirthYearStats, Capability, CategoryCount, DemographicStats, DurationStats, Hms, StationStats,
    StatisticsReport, TimeStats,
};
use crate::trips::{
    BIRTH_YEAR, END_STATION, END_TIME, GENDER, START_STATION, START_TIME, TRIP_DURATION, USER_TYPE,
};

const RULE: &str = "----------------------------------------";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serializes any result value as pretty-printed JSON.
pub fn to_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Writes the rows of `dataset` to a CSV file using the source column names.
///
/// Optional columns are written only when the city records them. Returns the
/// number of rows written.
pub fn write_records(path: &Path, dataset: &FilteredDataset) -> Result<usize> {
    let caps = dataset.capabilities();
    debug!(path = %path.display(), rows = dataset.len(), "Writing CSV export");

    let mut writer = csv::Writer::from_writer(File::create(path)?);

    let mut header = vec![
        START_TIME,
        END_TIME,
        TRIP_DURATION,
        START_STATION,
        END_STATION,
        USER_TYPE,
    ];
    if caps.has_gender {
        header.push(GENDER);
    }
    if caps.has_birth_year {
        header.push(BIRTH_YEAR);
    }
    writer.write_record(&header)?;

    for r in dataset.records() {
        let mut row = vec![
            r.start_time().format(TIMESTAMP_FORMAT).to_string(),
            r.end_time
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            r.duration_seconds.to_string(),
            r.start_station.clone(),
            r.end_station.clone(),
            r.user_type.clone(),
        ];
        if caps.has_gender {
            row.push(r.gender.clone().unwrap_or_default());
        }
        if caps.has_birth_year {
            row.push(r.birth_year.map(|y| y.to_string()).unwrap_or_default());
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = dataset.len(), "CSV export written");

    Ok(dataset.len())
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "trip" } else { "trips" }
}

/// `1 hour`, `2 hours`, `0 minutes`.
struct Quantity(u64, &'static str);

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Quantity(n, unit) = *self;
        write!(f, "{n} {unit}{}", if n == 1 { "" } else { "s" })
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = Quantity(self.minutes, "minute");
        let seconds = Quantity(self.seconds, "second");
        if self.hours > 0 {
            let hours = Quantity(self.hours, "hour");
            write!(f, "{hours}, {minutes} and {seconds}")
        } else {
            write!(f, "{minutes} and {seconds}")
        }
    }
}

fn write_group<T>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    group: &Result<T, ExplorerError>,
    body: impl FnOnce(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    writeln!(f, "{title}")?;
    match group {
        Ok(value) => body(f, value)?,
        Err(e) => writeln!(f, "  {e}")?,
    }
    writeln!(f, "{RULE}")
}

fn write_time(f: &mut fmt::Formatter<'_>, t: &TimeStats) -> fmt::Result {
    writeln!(
        f,
        "  Most common month:       {} ({} {})",
        t.month_name,
        t.month.count,
        plural(t.month.count)
    )?;
    writeln!(
        f,
        "  Most common day of week: {} ({} {})",
        t.day_name,
        t.day_of_week.count,
        plural(t.day_of_week.count)
    )?;
    writeln!(
        f,
        "  Most common start hour:  {} ({} {})",
        t.hour_label,
        t.hour.count,
        plural(t.hour.count)
    )
}

fn write_stations(f: &mut fmt::Formatter<'_>, s: &StationStats) -> fmt::Result {
    writeln!(
        f,
        "  Most common start station: {} ({} {})",
        s.start_station.value,
        s.start_station.count,
        plural(s.start_station.count)
    )?;
    writeln!(
        f,
        "  Most common end station:   {} ({} {})",
        s.end_station.value,
        s.end_station.count,
        plural(s.end_station.count)
    )?;
    writeln!(
        f,
        "  Most common trip:          {} to {} ({} {})",
        s.trip.value.start_station,
        s.trip.value.end_station,
        s.trip.count,
        plural(s.trip.count)
    )
}

fn write_durations(f: &mut fmt::Formatter<'_>, d: &DurationStats) -> fmt::Result {
    writeln!(f, "  Total travel time:   {}", d.total)?;
    writeln!(f, "  Average travel time: {}", d.mean)
}

fn write_counts(f: &mut fmt::Formatter<'_>, counts: &[CategoryCount]) -> fmt::Result {
    if counts.is_empty() {
        return writeln!(f, "    (none recorded)");
    }
    for c in counts {
        writeln!(f, "    {:<12} {}", c.value, c.count)?;
    }
    Ok(())
}

fn write_demographics(f: &mut fmt::Formatter<'_>, d: &DemographicStats, city: &str) -> fmt::Result {
    match &d.gender {
        Capability::Available(counts) => {
            writeln!(f, "  Counts of each gender:")?;
            write_counts(f, counts)?;
        }
        Capability::Unavailable => writeln!(f, "  Gender data is not available for {city}")?,
    }
    match &d.birth_year {
        Capability::Available(Some(BirthYearStats {
            earliest,
            most_recent,
            most_common,
        })) => {
            writeln!(f, "  Earliest birth year:    {earliest}")?;
            writeln!(f, "  Most recent birth year: {most_recent}")?;
            writeln!(f, "  Most common birth year: {most_common}")
        }
        Capability::Available(None) => {
            writeln!(f, "  No birth years recorded for the selected trips")
        }
        Capability::Unavailable => writeln!(f, "  Birth year data is not available for {city}"),
    }
}

impl fmt::Display for StatisticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let city = self.criteria.city.name();

        writeln!(f, "{RULE}")?;
        writeln!(f, "{} ({} {})", self.criteria, self.trips, plural(self.trips))?;
        writeln!(f, "{RULE}")?;

        write_group(f, "Most popular times of travel", &self.time, write_time)?;
        write_group(f, "Most popular stations and trip", &self.stations, write_stations)?;
        write_group(f, "Trip duration", &self.durations, write_durations)?;

        writeln!(f, "User stats")?;
        writeln!(f, "  Counts of each user type:")?;
        write_counts(f, &self.user_types)?;
        write_demographics(f, &self.demographics, city)?;
        writeln!(f, "{RULE}")
    }
}

impl fmt::Display for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.records.is_empty() {
            return writeln!(f, "No more trips to show.");
        }

        for (i, r) in self.records.iter().enumerate() {
            write!(
                f,
                "#{:<6} {}  {:>8.0}s  {} -> {}  {}",
                self.start + i + 1,
                r.start_time().format(TIMESTAMP_FORMAT),
                r.duration_seconds,
                r.start_station,
                r.end_station,
                r.user_type
            )?;
            if let Some(gender) = &r.gender {
                write!(f, "  {gender}")?;
            }
            if let Some(year) = r.birth_year {
                write!(f, "  born {year}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
