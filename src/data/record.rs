//! Typed crash row, used to build tables by hand.

use super::columns::*;
use polars::prelude::*;

/// One crash record. Coordinates are optional because the source extracts
/// leave them blank for crashes that were never geocoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrashRecord {
    pub collision_id: i64,
    pub injury_count: i64,
    pub fatal_count: i64,
    pub motorcycle_death_count: i64,
    pub bicycle_death_count: i64,
    pub pedestrian_death_count: i64,
    pub crash_month: i64,
    pub crash_year: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CrashRecord {
    /// A record at the given position with every count set to zero.
    pub fn at(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude: Some(longitude),
            latitude: Some(latitude),
            ..Self::default()
        }
    }

    /// Whether the record can be placed on the map.
    pub fn has_position(&self) -> bool {
        self.longitude.is_some_and(f64::is_finite) && self.latitude.is_some_and(f64::is_finite)
    }

    /// Build a table with the loader's column layout.
    pub fn to_dataframe(records: &[CrashRecord]) -> PolarsResult<DataFrame> {
        let ints = |f: fn(&CrashRecord) -> i64| records.iter().map(f).collect::<Vec<i64>>();

        DataFrame::new(vec![
            Column::new(CRN.into(), ints(|r| r.collision_id)),
            Column::new(INJURY_COUNT.into(), ints(|r| r.injury_count)),
            Column::new(FATAL_COUNT.into(), ints(|r| r.fatal_count)),
            Column::new(MCYCLE_DEATH_COUNT.into(), ints(|r| r.motorcycle_death_count)),
            Column::new(BICYCLE_DEATH_COUNT.into(), ints(|r| r.bicycle_death_count)),
            Column::new(PED_DEATH_COUNT.into(), ints(|r| r.pedestrian_death_count)),
            Column::new(CRASH_MONTH.into(), ints(|r| r.crash_month)),
            Column::new(CRASH_YEAR.into(), ints(|r| r.crash_year)),
            Column::new(
                DEC_LAT.into(),
                records.iter().map(|r| r.latitude).collect::<Vec<Option<f64>>>(),
            ),
            Column::new(
                DEC_LONG.into(),
                records.iter().map(|r| r.longitude).collect::<Vec<Option<f64>>>(),
            ),
        ])
    }

    /// An empty table with the loader's column layout.
    pub fn empty_dataframe() -> PolarsResult<DataFrame> {
        Self::to_dataframe(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dataframe_has_whitelist_schema() {
        let df = CrashRecord::empty_dataframe().unwrap();
        assert_eq!(df.height(), 0);
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, REQUIRED_COLUMNS.map(String::from).to_vec());
    }

    #[test]
    fn missing_coordinates_become_nulls() {
        let mut record = CrashRecord::at(-75.16, 39.95);
        record.latitude = None;
        assert!(!record.has_position());

        let df = CrashRecord::to_dataframe(&[record]).unwrap();
        assert_eq!(df.column(DEC_LAT).unwrap().null_count(), 1);
        assert_eq!(df.column(DEC_LONG).unwrap().null_count(), 0);
    }
}
