use phila_crash_map::data::{CrashDataCache, DataLoader, LoadOptions, LoaderError};
use polars::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = "CRN,INJURY_COUNT,FATAL_COUNT,MCYCLE_DEATH_COUNT,BICYCLE_DEATH_COUNT,\
PED_DEATH_COUNT,CRASH_MONTH,CRASH_YEAR,DEC_LAT,DEC_LONG,ROAD_CONDITION";

fn write_csv(dir: &Path, name: &str, rows: &[&str]) {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    fs::write(dir.join(name), text).unwrap();
}

#[test]
fn empty_directory_gives_an_empty_table() {
    let dir = TempDir::new().unwrap();
    let df = DataLoader::read_directory(dir.path(), &LoadOptions::default()).unwrap();
    assert_eq!(df.height(), 0);
    assert_eq!(df.width(), 10);
}

#[test]
fn empty_directory_can_be_an_error() {
    let dir = TempDir::new().unwrap();
    let options = LoadOptions {
        require_non_empty: true,
        ..LoadOptions::default()
    };
    let err = DataLoader::read_directory(dir.path(), &options).unwrap_err();
    assert!(matches!(err, LoaderError::NoMatchingFiles { .. }));
}

#[test]
fn reads_only_prefixed_files_and_keeps_the_whitelist() {
    let dir = TempDir::new().unwrap();
    write_csv(
        dir.path(),
        "CRASH_2019.csv",
        &["1,0,1,0,0,0,1,2019,39.95,-75.16,dry", "2,2,0,0,0,0,2,2019,,,wet"],
    );
    write_csv(dir.path(), "CRASH_2020.csv", &["3,1,0,0,0,1,3,2020,40.0,-75.1,dry"]);
    write_csv(dir.path(), "PERSON_2019.csv", &["9,9,9,9,9,9,9,2019,40.0,-75.1,dry"]);
    fs::write(dir.path().join("CRASH_notes.txt"), "not a table").unwrap();

    let df = DataLoader::read_directory(dir.path(), &LoadOptions::default()).unwrap();
    assert_eq!(df.height(), 3);
    assert!(df.column("ROAD_CONDITION").is_err());
    assert_eq!(df.column("CRN").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("DEC_LAT").unwrap().dtype(), &DataType::Float64);

    // files are read in name order
    let crn: Vec<Option<i64>> = df.column("CRN").unwrap().i64().unwrap().into_iter().collect();
    assert_eq!(crn, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn missing_column_aborts_the_load() {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "CRASH_2019.csv", &["1,0,1,0,0,0,1,2019,39.95,-75.16,dry"]);
    fs::write(
        dir.path().join("CRASH_2020.csv"),
        "CRN,INJURY_COUNT\n2,0\n",
    )
    .unwrap();

    let err = DataLoader::read_directory(dir.path(), &LoadOptions::default()).unwrap_err();
    match err {
        LoaderError::MissingColumn { column, .. } => assert_eq!(column, "FATAL_COUNT"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn malformed_values_abort_the_load() {
    let dir = TempDir::new().unwrap();
    write_csv(
        dir.path(),
        "CRASH_2019.csv",
        &["1,zero,1,0,0,0,1,2019,39.95,-75.16,dry"],
    );
    let err = DataLoader::read_directory(dir.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoaderError::Parse { .. }));
}

#[test]
fn reads_parquet_extracts() {
    let dir = TempDir::new().unwrap();
    let mut df = df!(
        "CRN" => [10i64, 11],
        "INJURY_COUNT" => [1i64, 0],
        "FATAL_COUNT" => [0i64, 2],
        "MCYCLE_DEATH_COUNT" => [0i64, 1],
        "BICYCLE_DEATH_COUNT" => [0i64, 0],
        "PED_DEATH_COUNT" => [0i64, 1],
        "CRASH_MONTH" => [5i64, 6],
        "CRASH_YEAR" => [2021i64, 2021],
        "DEC_LAT" => [39.95f64, 40.01],
        "DEC_LONG" => [-75.16f64, -75.12]
    )
    .unwrap();
    let mut file = fs::File::create(dir.path().join("CRASH_2021.parquet")).unwrap();
    ParquetWriter::new(&mut file).finish(&mut df).unwrap();

    let df = DataLoader::read_directory(dir.path(), &LoadOptions::default()).unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(
        df.column("FATAL_COUNT").unwrap().i64().unwrap().sum(),
        Some(2)
    );
}

#[test]
fn single_file_path_is_accepted() {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "CRASH_2019.csv", &["1,0,1,0,0,0,1,2019,39.95,-75.16,dry"]);

    let mut loader = DataLoader::default();
    let path = dir.path().join("CRASH_2019.csv");
    loader.load(&path).unwrap();
    assert_eq!(loader.get_row_count(), 1);
    assert_eq!(loader.get_source(), Some(&path));
}

#[test]
fn raw_read_keeps_every_column() {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "CRASH_2019.csv", &["1,0,1,0,0,0,1,2019,39.95,-75.16,dry"]);
    let df = DataLoader::read_raw_path(dir.path(), &LoadOptions::default()).unwrap();
    assert_eq!(df.width(), 11);
    assert!(df.column("ROAD_CONDITION").is_ok());
}

#[test]
fn cache_drops_unlocated_rows_and_reuses_tables() {
    let dir = TempDir::new().unwrap();
    write_csv(
        dir.path(),
        "CRASH_2019.csv",
        &["1,0,1,0,0,0,1,2019,39.95,-75.16,dry", "2,2,0,0,0,0,2,2019,,,wet"],
    );

    let cache = CrashDataCache::default();
    let first = cache.get_or_load(dir.path()).unwrap();
    assert_eq!(first.height(), 1);
    assert!(cache.contains(dir.path()));

    // a new file is not seen until the cache is invalidated
    write_csv(dir.path(), "CRASH_2020.csv", &["3,1,0,0,0,1,3,2020,40.0,-75.1,dry"]);
    let second = cache.get_or_load(dir.path()).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    cache.invalidate();
    assert!(!cache.contains(dir.path()));
    assert_eq!(cache.get_or_load(dir.path()).unwrap().height(), 2);
}

#[test]
fn cache_drops_nan_coordinates() {
    let dir = TempDir::new().unwrap();
    write_csv(
        dir.path(),
        "CRASH_2019.csv",
        &["1,0,1,0,0,0,1,2019,39.95,-75.16,dry", "2,0,1,0,0,0,1,2019,NaN,NaN,dry"],
    );

    let df = CrashDataCache::default().get_or_load(dir.path()).unwrap();
    assert_eq!(df.height(), 1);
    let crn: Vec<Option<i64>> = df.column("CRN").unwrap().i64().unwrap().into_iter().collect();
    assert_eq!(crn, vec![Some(1)]);
}
