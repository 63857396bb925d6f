//! Fixed lookup tables: the supported cities, the filterable months, and the
//! day-of-week names.

use std::fmt;
use std::str::FromStr;

use chrono::{Month, Weekday};
use serde::Serialize;

use crate::error::ExplorerError;

/// A city with published trip data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Chicago,
    NewYork,
    Washington,
}

impl City {
    pub const ALL: [City; 3] = [City::Chicago, City::NewYork, City::Washington];

    /// Source file name for this city, relative to the data root.
    pub fn file_name(self) -> &'static str {
        match self {
            City::Chicago => "chicago.csv",
            City::NewYork => "new_york_city.csv",
            City::Washington => "washington.csv",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            City::Chicago => "Chicago",
            City::NewYork => "New York City",
            City::Washington => "Washington",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for City {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chicago" => Ok(City::Chicago),
            "new york" | "new york city" | "new_york_city" | "nyc" => Ok(City::NewYork),
            "washington" => Ok(City::Washington),
            other => Err(ExplorerError::InvalidFilter(format!(
                "unknown city '{other}' (expected Chicago, New York, or Washington)"
            ))),
        }
    }
}

/// Months that can be selected as a filter, January=1 through June=6.
pub const FILTER_MONTHS: [Month; 6] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
];

const DAYS: [(Weekday, &str); 7] = [
    (Weekday::Sun, "Sunday"),
    (Weekday::Mon, "Monday"),
    (Weekday::Tue, "Tuesday"),
    (Weekday::Wed, "Wednesday"),
    (Weekday::Thu, "Thursday"),
    (Weekday::Fri, "Friday"),
    (Weekday::Sat, "Saturday"),
];

/// Full English name of a weekday, e.g. `"Monday"`.
pub fn weekday_name(day: Weekday) -> &'static str {
    DAYS.iter()
        .find(|(d, _)| *d == day)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

/// 1-based index of a filterable month, or `None` past June.
pub fn filter_month_index(month: Month) -> Option<u32> {
    FILTER_MONTHS
        .iter()
        .position(|m| *m == month)
        .map(|i| i as u32 + 1)
}

/// Case-insensitive lookup of a filterable month by its full name.
pub fn parse_month(s: &str) -> Result<Month, ExplorerError> {
    let wanted = s.trim();
    FILTER_MONTHS
        .iter()
        .copied()
        .find(|m| m.name().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| {
            ExplorerError::InvalidFilter(format!(
                "unknown month '{wanted}' (expected January through June, or all)"
            ))
        })
}

/// Case-insensitive lookup of a weekday by its full name.
pub fn parse_weekday(s: &str) -> Result<Weekday, ExplorerError> {
    let wanted = s.trim();
    DAYS.iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(wanted))
        .map(|(day, _)| *day)
        .ok_or_else(|| {
            ExplorerError::InvalidFilter(format!(
                "unknown day '{wanted}' (expected Sunday through Saturday, or all)"
            ))
        })
}
