//! Data Processor Module
//! Row selection over the crash table: position cleaning and metric filters.

use super::columns::{DEC_LAT, DEC_LONG};
use crate::hex::MetricSelector;
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Handles data cleaning and row filtering.
pub struct DataProcessor;

impl DataProcessor {
    /// Drop rows whose longitude or latitude is missing, NaN or infinite.
    pub fn drop_missing_positions(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let located = |name: &str| col(name).is_not_null().and(col(name).is_finite());
        let cleaned = df
            .clone()
            .lazy()
            .filter(located(DEC_LONG).and(located(DEC_LAT)))
            .collect()?;

        let dropped = df.height() - cleaned.height();
        if dropped > 0 {
            log::debug!("Dropped {dropped} rows without coordinates");
        }
        Ok(cleaned)
    }

    /// Keep the rows that count toward `metric`.
    ///
    /// Metrics backed by a count column keep rows where that column is
    /// strictly positive; Total Collisions keeps every row.
    pub fn filter_by_metric(
        df: &DataFrame,
        metric: MetricSelector,
    ) -> Result<DataFrame, ProcessorError> {
        let Some(column) = metric.column() else {
            return Ok(df.clone());
        };

        let filtered = df
            .clone()
            .lazy()
            .filter(col(column).gt(lit(0)))
            .collect()?;
        Ok(filtered)
    }

    /// Metric filter followed by position cleaning: the rows that end up on
    /// the map for `metric`.
    pub fn select_for_metric(
        df: &DataFrame,
        metric: MetricSelector,
    ) -> Result<DataFrame, ProcessorError> {
        let filtered = Self::filter_by_metric(df, metric)?;
        let selected = Self::drop_missing_positions(&filtered)?;
        log::debug!(
            "{metric}: {} of {} rows selected",
            selected.height(),
            df.height()
        );
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CrashRecord;
    use strum::IntoEnumIterator;

    fn sample() -> DataFrame {
        let mut rows = vec![
            CrashRecord::at(-75.16, 39.95),
            CrashRecord::at(-75.17, 39.96),
            CrashRecord::at(-75.18, 39.97),
            CrashRecord::at(-75.19, 39.98),
            CrashRecord::default(),
        ];
        rows[0].fatal_count = 1;
        rows[0].injury_count = 2;
        rows[1].injury_count = 1;
        rows[2].motorcycle_death_count = 1;
        rows[2].fatal_count = 1;
        rows[3].pedestrian_death_count = 1;
        rows[3].fatal_count = 1;
        rows[4].fatal_count = 3;
        rows[4].longitude = Some(-75.2);
        CrashRecord::to_dataframe(&rows).unwrap()
    }

    #[test]
    fn filters_on_backing_column() {
        let df = sample();
        let fatal = DataProcessor::filter_by_metric(&df, MetricSelector::TotalFatalities).unwrap();
        assert_eq!(fatal.height(), 4);

        let injured = DataProcessor::filter_by_metric(&df, MetricSelector::TotalInjured).unwrap();
        assert_eq!(injured.height(), 2);

        let moto =
            DataProcessor::filter_by_metric(&df, MetricSelector::MotorcycleFatalities).unwrap();
        assert_eq!(moto.height(), 1);
    }

    #[test]
    fn total_collisions_keeps_every_row() {
        let df = sample();
        let all = DataProcessor::filter_by_metric(&df, MetricSelector::TotalCollisions).unwrap();
        assert_eq!(all.height(), df.height());
    }

    #[test]
    fn filtering_is_idempotent() {
        let df = sample();
        for metric in MetricSelector::iter() {
            let once = DataProcessor::filter_by_metric(&df, metric).unwrap();
            let twice = DataProcessor::filter_by_metric(&once, metric).unwrap();
            assert!(once.equals_missing(&twice), "{metric} not idempotent");
        }
    }

    #[test]
    fn dropping_positions_is_idempotent_and_never_grows() {
        let df = sample();
        let once = DataProcessor::drop_missing_positions(&df).unwrap();
        let twice = DataProcessor::drop_missing_positions(&once).unwrap();
        assert!(once.height() <= df.height());
        assert_eq!(once.height(), 4);
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn non_finite_positions_are_dropped() {
        let mut rows = vec![
            CrashRecord::at(-75.16, 39.95),
            CrashRecord::at(f64::NAN, 39.95),
            CrashRecord::at(-75.16, f64::NAN),
            CrashRecord::at(f64::INFINITY, 39.95),
        ];
        for row in &mut rows {
            row.fatal_count = 1;
        }
        assert!(!rows[1].has_position());
        let df = CrashRecord::to_dataframe(&rows).unwrap();

        let cleaned = DataProcessor::drop_missing_positions(&df).unwrap();
        assert_eq!(cleaned.height(), 1);
        let selected =
            DataProcessor::select_for_metric(&df, MetricSelector::TotalFatalities).unwrap();
        assert_eq!(selected.height(), 1);
    }

    #[test]
    fn select_applies_both_steps() {
        let df = sample();
        let selected =
            DataProcessor::select_for_metric(&df, MetricSelector::TotalFatalities).unwrap();
        // The fourth fatal row has no latitude.
        assert_eq!(selected.height(), 3);
    }
}
