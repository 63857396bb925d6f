use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::{env, fs};

use bikeshare_explorer::browse::BrowseCursor;
use bikeshare_explorer::city::City;
use bikeshare_explorer::filter::{FilterCriteria, filter};
use bikeshare_explorer::source::DirResolver;
use bikeshare_explorer::stats::{
    BirthYearStats, Capability, CategoryCount, Hms, StatisticsReport, demographic_stats,
    duration_stats, station_stats, time_stats, user_type_counts,
};
use bikeshare_explorer::trips::TripStore;
use chrono::Weekday;
use flate2::Compression;
use flate2::write::GzEncoder;

fn fixtures() -> DirResolver {
    DirResolver::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
}

fn count(value: &str, count: usize) -> CategoryCount {
    CategoryCount {
        value: value.to_string(),
        count,
    }
}

#[tokio::test]
async fn test_full_pipeline_april() {
    let store = TripStore::load(&fixtures(), City::Chicago)
        .await
        .expect("Failed to load fixture");
    assert_eq!(store.len(), 12);

    let criteria = FilterCriteria::parse("chicago", "april", "all").unwrap();
    let april = filter(&store, &criteria).unwrap();
    assert_eq!(april.len(), 9);

    let time = time_stats(&april).unwrap();
    assert_eq!(time.month_name, "April");
    assert_eq!(time.day_of_week.value, Weekday::Mon);
    assert_eq!(time.hour.value, 8);
    assert_eq!(time.hour_label, "8 AM");

    let stations = station_stats(&april).unwrap();
    assert_eq!(stations.start_station.value, "Canal St & Adams St");
    assert_eq!(stations.end_station.value, "Clinton St & Washington Blvd");
    assert_eq!(stations.trip.value.start_station, "Canal St & Adams St");
    assert_eq!(stations.trip.count, 4);

    let durations = duration_stats(&april).unwrap();
    assert_eq!(durations.total_seconds, 10505.0);
    assert_eq!(durations.total, Hms { hours: 2, minutes: 55, seconds: 5 });
    assert_eq!(durations.mean, Hms { hours: 0, minutes: 19, seconds: 27 });

    assert_eq!(
        user_type_counts(&april),
        vec![count("Subscriber", 7), count("Customer", 2)]
    );

    let demographics = demographic_stats(&april);
    assert_eq!(
        demographics.gender,
        Capability::Available(vec![count("Male", 4), count("Female", 3)])
    );
    assert_eq!(
        demographics.birth_year,
        Capability::Available(Some(BirthYearStats {
            earliest: 1965,
            most_recent: 1992,
            most_common: 1990,
        }))
    );
}

#[tokio::test]
async fn test_whole_city_prefers_april() {
    let store = TripStore::load(&fixtures(), City::Chicago).await.unwrap();
    let all = filter(&store, &FilterCriteria::all(City::Chicago)).unwrap();

    assert_eq!(all.records(), store.records());

    let report = StatisticsReport::compute(Arc::new(all)).await.unwrap();
    assert_eq!(report.trips, 12);
    assert_eq!(report.time.unwrap().month.value, 4);
    assert_eq!(report.durations.unwrap().total.as_seconds(), 13301);
}

#[tokio::test]
async fn test_city_without_demographics() {
    let store = TripStore::load(&fixtures(), City::Washington).await.unwrap();
    assert!(!store.has_gender());
    assert!(!store.has_birth_year());

    let all = filter(&store, &FilterCriteria::all(City::Washington)).unwrap();
    let demographics = demographic_stats(&all);
    assert_eq!(demographics.gender, Capability::Unavailable);
    assert_eq!(demographics.birth_year, Capability::Unavailable);
}

#[tokio::test]
async fn test_browse_washington() {
    let store = TripStore::load(&fixtures(), City::Washington).await.unwrap();
    let all = filter(&store, &FilterCriteria::all(City::Washington)).unwrap();
    let mut cursor = BrowseCursor::new();

    let mut sizes = Vec::new();
    let mut more = Vec::new();
    for _ in 0..3 {
        let page = cursor.next_page(&all);
        sizes.push(page.len());
        more.push(page.has_more);
    }

    assert_eq!(sizes, vec![5, 2, 0]);
    assert_eq!(more, vec![true, false, false]);
}

#[tokio::test]
async fn test_missing_city_source() {
    let err = TripStore::load(&fixtures(), City::NewYork).await.unwrap_err();
    assert!(matches!(
        err,
        bikeshare_explorer::ExplorerError::SourceUnavailable { city: City::NewYork, .. }
    ));
}

#[tokio::test]
async fn test_gzip_source() {
    let dir = env::temp_dir().join("bikeshare_explorer_gzip_fixture");
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/chicago.csv");
    let plain = fs::read(fixture).unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&plain).unwrap();
    fs::write(dir.join("chicago.csv.gz"), encoder.finish().unwrap()).unwrap();

    let store = TripStore::load(&DirResolver::new(&dir), City::Chicago).await.unwrap();
    assert_eq!(store.len(), 12);
    assert!(store.has_gender());

    fs::remove_dir_all(&dir).unwrap();
}
