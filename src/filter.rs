//! Month / day-of-week selection over a [`TripStore`].

use std::fmt;
use std::str::FromStr;

use chrono::{Month, Weekday};
use serde::Serialize;
use tracing::debug;

use crate::city::{City, filter_month_index, parse_month, parse_weekday, weekday_name};
use crate::error::{ExplorerError, Result};
use crate::trips::{Capabilities, TripRecord, TripStore};

/// Month selection. Only January through June are valid concrete months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthFilter {
    All,
    Only(Month),
}

impl MonthFilter {
    /// 1-based month index to match, or `None` for [`MonthFilter::All`].
    fn index(self) -> Result<Option<u32>> {
        match self {
            MonthFilter::All => Ok(None),
            MonthFilter::Only(month) => filter_month_index(month).map(Some).ok_or_else(|| {
                ExplorerError::InvalidFilter(format!(
                    "{} is outside the January-June range covered by the data",
                    month.name()
                ))
            }),
        }
    }
}

impl FromStr for MonthFilter {
    type Err = ExplorerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(MonthFilter::All)
        } else {
            parse_month(s).map(MonthFilter::Only)
        }
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str("All"),
            MonthFilter::Only(month) => f.write_str(month.name()),
        }
    }
}

/// Day-of-week selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayFilter {
    All,
    Only(Weekday),
}

impl FromStr for DayFilter {
    type Err = ExplorerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(DayFilter::All)
        } else {
            parse_weekday(s).map(DayFilter::Only)
        }
    }
}

impl fmt::Display for DayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayFilter::All => f.write_str("All"),
            DayFilter::Only(day) => f.write_str(weekday_name(*day)),
        }
    }
}

/// A (city, month, day) selection. Month and day may both be concrete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCriteria {
    pub city: City,
    pub month: MonthFilter,
    pub day: DayFilter,
}

impl FilterCriteria {
    pub fn new(city: City, month: MonthFilter, day: DayFilter) -> Self {
        Self { city, month, day }
    }

    /// Everything recorded for `city`.
    pub fn all(city: City) -> Self {
        Self::new(city, MonthFilter::All, DayFilter::All)
    }

    /// Builds criteria from already-collected text, case-insensitively.
    pub fn parse(city: &str, month: &str, day: &str) -> Result<Self> {
        Ok(Self::new(city.parse()?, month.parse()?, day.parse()?))
    }
}

impl fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, month: {}, day: {}", self.city, self.month, self.day)
    }
}

impl Serialize for FilterCriteria {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut st = s.serialize_struct("FilterCriteria", 3)?;
        st.serialize_field("city", &self.city)?;
        st.serialize_field("month", &self.month.to_string())?;
        st.serialize_field("day", &self.day.to_string())?;
        st.end()
    }
}

/// Trips left after applying a [`FilterCriteria`], in source order.
#[derive(Debug, Clone)]
pub struct FilteredDataset {
    criteria: FilterCriteria,
    capabilities: Capabilities,
    records: Vec<TripRecord>,
}

impl FilteredDataset {
    pub fn new(
        criteria: FilterCriteria,
        capabilities: Capabilities,
        records: Vec<TripRecord>,
    ) -> Self {
        Self {
            criteria,
            capabilities,
            records,
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.criteria
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn records(&self) -> &[TripRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Selects the trips of `store` matching `criteria`.
///
/// # Errors
///
/// [`ExplorerError::InvalidFilter`] when the month is past June or the
/// criteria name a different city than the store. Checked before scanning.
#[tracing::instrument(skip(store), fields(criteria = %criteria))]
pub fn filter(store: &TripStore, criteria: &FilterCriteria) -> Result<FilteredDataset> {
    if criteria.city != store.city() {
        return Err(ExplorerError::InvalidFilter(format!(
            "criteria are for {} but the loaded data is for {}",
            criteria.city,
            store.city()
        )));
    }

    let month = criteria.month.index()?;
    let day = match criteria.day {
        DayFilter::All => None,
        DayFilter::Only(day) => Some(day),
    };

    let records: Vec<TripRecord> = store
        .records()
        .iter()
        .filter(|r| month.is_none_or(|m| r.month() == m))
        .filter(|r| day.is_none_or(|d| r.day_of_week() == d))
        .cloned()
        .collect();

    debug!(kept = records.len(), total = store.len(), "Filter applied");

    Ok(FilteredDataset::new(*criteria, store.capabilities(), records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn store() -> TripStore {
        // 2017-03-06 is a Monday, 2017-04-04 a Tuesday, 2017-04-10 a Monday
        let records = vec![
            TripRecord::new(at(3, 6, 8), "A", "B", 60.0, "Subscriber"),
            TripRecord::new(at(4, 4, 9), "B", "C", 120.0, "Customer"),
            TripRecord::new(at(4, 10, 17), "C", "A", 180.0, "Subscriber"),
            TripRecord::new(at(6, 30, 23), "A", "C", 240.0, "Subscriber"),
        ];
        TripStore::from_records(City::Chicago, records, Capabilities::default())
    }

    #[test]
    fn test_parse_criteria() {
        let criteria = FilterCriteria::parse("new york", "APRIL", "all").unwrap();
        assert_eq!(criteria.city, City::NewYork);
        assert_eq!(criteria.month, MonthFilter::Only(Month::April));
        assert_eq!(criteria.day, DayFilter::All);

        assert!(FilterCriteria::parse("chicago", "july", "all").is_err());
        assert!(FilterCriteria::parse("chicago", "all", "funday").is_err());
    }

    #[test]
    fn test_all_is_identity() {
        let store = store();
        let filtered = filter(&store, &FilterCriteria::all(City::Chicago)).unwrap();
        assert_eq!(filtered.records(), store.records());
    }

    #[test]
    fn test_month_filter_and_complement() {
        let store = store();
        let criteria =
            FilterCriteria::new(City::Chicago, MonthFilter::Only(Month::April), DayFilter::All);
        let filtered = filter(&store, &criteria).unwrap();

        assert_eq!(filtered.len(), 2);
        assert!(filtered.records().iter().all(|r| r.month() == 4));

        let excluded = store
            .records()
            .iter()
            .filter(|r| !filtered.records().contains(r))
            .count();
        assert_eq!(excluded + filtered.len(), store.len());
        assert!(
            store
                .records()
                .iter()
                .filter(|r| !filtered.records().contains(r))
                .all(|r| r.month() != 4)
        );
    }

    #[test]
    fn test_day_filter() {
        let store = store();
        let criteria = FilterCriteria::parse("chicago", "all", "monday").unwrap();
        let filtered = filter(&store, &criteria).unwrap();

        let months: Vec<u32> = filtered.records().iter().map(|r| r.month()).collect();
        assert_eq!(months, vec![3, 4]);
    }

    #[test]
    fn test_month_and_day_combine() {
        let store = store();
        let criteria = FilterCriteria::parse("chicago", "april", "monday").unwrap();
        let filtered = filter(&store, &criteria).unwrap();

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.records()[0].hour(), 17);
    }

    #[test]
    fn test_month_past_june_is_rejected() {
        let store = store();
        let criteria =
            FilterCriteria::new(City::Chicago, MonthFilter::Only(Month::July), DayFilter::All);
        assert!(matches!(
            filter(&store, &criteria),
            Err(ExplorerError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_city_mismatch_is_rejected() {
        let store = store();
        assert!(matches!(
            filter(&store, &FilterCriteria::all(City::Washington)),
            Err(ExplorerError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let store = store();
        let criteria = FilterCriteria::parse("chicago", "april", "all").unwrap();
        let first = filter(&store, &criteria).unwrap();
        let second = filter(&store, &criteria).unwrap();
        assert_eq!(first.records(), second.records());
    }
}
