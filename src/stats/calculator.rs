//! Statistics Calculator Module
//! Exploratory summaries of a crash table: describe-style column statistics,
//! missing-data percentages and IQR outliers.

use crate::data::numeric_columns;
use polars::prelude::*;
use rayon::prelude::*;
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// Default share of missing values above which a column is dropped.
pub const DEFAULT_MISSING_THRESHOLD: f64 = 15.0;

/// Default IQR multiplier for numeric outliers.
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 1.5;

/// Text columns with fewer distinct values than this get a count chart.
pub const DEFAULT_MAX_CATEGORIES: usize = 10;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Threshold must be a non-negative number, got {0}")]
    InvalidThreshold(f64),
}

/// Describe-style statistics for one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

/// Describe-style statistics for one text column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalStats {
    pub name: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

/// Missing values of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingInfo {
    pub name: String,
    pub missing_count: usize,
    pub missing_percentage: f64,
}

/// Overview of a whole table.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrameSummary {
    pub rows: usize,
    pub columns: usize,
    pub dtype_counts: BTreeMap<String, usize>,
    pub missing: Vec<MissingInfo>,
    pub numeric: Vec<ColumnStats>,
    pub categorical: Vec<CategoricalStats>,
}

/// Outliers found in one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Outliers {
    /// Values outside `[Q1 - k*IQR, Q3 + k*IQR]`.
    Numeric { values: Vec<f64> },
    /// Row indices holding a value that occurs fewer than `k` times.
    Categorical { rows: Vec<usize> },
}

impl Outliers {
    pub fn count(&self) -> usize {
        match self {
            Self::Numeric { values } => values.len(),
            Self::Categorical { rows } => rows.len(),
        }
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(name: &str, values: &[f64]) -> ColumnStats {
        let n = values.len();
        if n == 0 {
            return ColumnStats {
                name: name.to_string(),
                count: 0,
                mean: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                p25: f64::NAN,
                median: f64::NAN,
                p75: f64::NAN,
                max: f64::NAN,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        ColumnStats {
            name: name.to_string(),
            count: n,
            mean: values.mean(),
            std: if n > 1 { values.std_dev() } else { f64::NAN },
            min: sorted[0],
            p25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Non-null values of a numeric column as `f64`.
    pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, SummaryError> {
        let column = df.column(name)?.cast(&DataType::Float64)?;
        Ok(column.f64()?.into_iter().flatten().collect())
    }

    /// Missing count and percentage for every column, in table order.
    pub fn percentage_missing(df: &DataFrame) -> Vec<MissingInfo> {
        let rows = df.height();
        df.get_columns()
            .iter()
            .map(|column| {
                let missing_count = column.null_count();
                let missing_percentage = if rows == 0 {
                    0.0
                } else {
                    missing_count as f64 / rows as f64 * 100.0
                };
                MissingInfo {
                    name: column.name().to_string(),
                    missing_count,
                    missing_percentage,
                }
            })
            .collect()
    }

    /// Drop the columns whose missing percentage exceeds `threshold`.
    pub fn filter_columns_by_missing_data(
        df: &DataFrame,
        threshold: f64,
    ) -> Result<DataFrame, SummaryError> {
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(SummaryError::InvalidThreshold(threshold));
        }
        let keep: Vec<String> = Self::percentage_missing(df)
            .into_iter()
            .filter(|info| info.missing_percentage <= threshold)
            .map(|info| info.name)
            .collect();

        let dropped = df.width() - keep.len();
        if dropped > 0 {
            log::info!("Dropping {dropped} column(s) with more than {threshold}% missing");
        }
        Ok(df.select(keep)?)
    }

    /// Outliers per column, computed in parallel.
    ///
    /// Numeric columns use the IQR rule with `threshold` as the multiplier.
    /// With `include_non_numeric`, text columns report the rows holding a
    /// value seen fewer than `threshold` times; columns without such values
    /// are left out.
    pub fn get_outliers(
        df: &DataFrame,
        threshold: f64,
        include_non_numeric: bool,
    ) -> Result<BTreeMap<String, Outliers>, SummaryError> {
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(SummaryError::InvalidThreshold(threshold));
        }

        let numeric = numeric_columns(df);
        let mut found: BTreeMap<String, Outliers> = numeric
            .par_iter()
            .map(|name| {
                let values = Self::column_values(df, name)?;
                Ok((name.clone(), Self::numeric_outliers(&values, threshold)))
            })
            .collect::<Result<_, SummaryError>>()?;

        if include_non_numeric {
            let text_columns: Vec<String> = df
                .get_columns()
                .iter()
                .filter(|c| c.dtype() == &DataType::String)
                .map(|c| c.name().to_string())
                .collect();

            let categorical: Vec<(String, Outliers)> = text_columns
                .par_iter()
                .map(|name| {
                    let rows = Self::rare_value_rows(df, name, threshold)?;
                    Ok((name.clone(), rows))
                })
                .collect::<Result<Vec<_>, SummaryError>>()?
                .into_iter()
                .filter(|(_, rows)| !rows.is_empty())
                .map(|(name, rows)| (name, Outliers::Categorical { rows }))
                .collect();
            found.extend(categorical);
        }

        Ok(found)
    }

    /// Values outside the IQR fences, in their original order.
    pub fn numeric_outliers(values: &[f64], threshold: f64) -> Outliers {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let q1 = Self::percentile(&sorted, 25.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let lower = q1 - threshold * iqr;
        let upper = q3 + threshold * iqr;

        Outliers::Numeric {
            values: values
                .iter()
                .copied()
                .filter(|&v| v < lower || v > upper)
                .collect(),
        }
    }

    /// Occurrences of each non-null value of a text column, most frequent
    /// first (ties by value).
    pub fn value_counts(df: &DataFrame, name: &str) -> Result<Vec<(String, usize)>, SummaryError> {
        let column = df.column(name)?.str()?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in column.into_iter().flatten() {
            *counts.entry(value).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(value, n)| (value.to_string(), n))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }

    /// Text columns holding at least one value and fewer than `max_unique`
    /// distinct values, in table order.
    pub fn low_cardinality_columns(
        df: &DataFrame,
        max_unique: usize,
    ) -> Result<Vec<String>, SummaryError> {
        let mut selected = Vec::new();
        for column in df.get_columns() {
            if column.dtype() != &DataType::String {
                continue;
            }
            let distinct = Self::value_counts(df, column.name())?.len();
            if distinct > 0 && distinct < max_unique {
                selected.push(column.name().to_string());
            }
        }
        Ok(selected)
    }

    fn rare_value_rows(
        df: &DataFrame,
        name: &str,
        threshold: f64,
    ) -> Result<Vec<usize>, SummaryError> {
        let column = df.column(name)?.str()?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in column.into_iter().flatten() {
            *counts.entry(value).or_default() += 1;
        }
        Ok(column
            .into_iter()
            .enumerate()
            .filter_map(|(row, value)| {
                let value = value?;
                ((counts[value] as f64) < threshold).then_some(row)
            })
            .collect())
    }

    fn categorical_stats(df: &DataFrame, name: &str) -> Result<CategoricalStats, SummaryError> {
        let column = df.column(name)?.str()?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in column.into_iter().flatten() {
            *counts.entry(value).or_default() += 1;
        }
        let top = counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(value, freq)| (value.to_string(), *freq));

        Ok(CategoricalStats {
            name: name.to_string(),
            count: column.len() - column.null_count(),
            unique: counts.len(),
            freq: top.as_ref().map(|(_, f)| *f).unwrap_or(0),
            top: top.map(|(value, _)| value),
        })
    }

    /// Shape, dtypes, missing data and describe-style statistics.
    pub fn dataframe_summary(df: &DataFrame) -> Result<DataFrameSummary, SummaryError> {
        let mut dtype_counts = BTreeMap::new();
        for column in df.get_columns() {
            *dtype_counts.entry(column.dtype().to_string()).or_insert(0) += 1;
        }

        let numeric = numeric_columns(df)
            .par_iter()
            .map(|name| {
                let values = Self::column_values(df, name)?;
                Ok(Self::compute_descriptive_stats(name, &values))
            })
            .collect::<Result<Vec<_>, SummaryError>>()?;

        let categorical = df
            .get_columns()
            .iter()
            .filter(|c| c.dtype() == &DataType::String)
            .map(|c| Self::categorical_stats(df, c.name()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DataFrameSummary {
            rows: df.height(),
            columns: df.width(),
            dtype_counts,
            missing: Self::percentage_missing(df),
            numeric,
            categorical,
        })
    }
}

impl fmt::Display for DataFrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shape of the dataframe:\n ({}, {})\n---", self.rows, self.columns)?;

        writeln!(f, "Value counts of data types:")?;
        for (dtype, count) in &self.dtype_counts {
            writeln!(f, " {dtype:<12} {count}")?;
        }
        writeln!(f, "---")?;

        writeln!(f, "Missing Values:")?;
        writeln!(f, " {:<24} {:>13} {:>22}", "", "Missing Count", "Missing Percentage (%)")?;
        for info in &self.missing {
            writeln!(
                f,
                " {:<24} {:>13} {:>22.4}",
                info.name, info.missing_count, info.missing_percentage
            )?;
        }
        writeln!(f, "---")?;

        writeln!(f, "Descriptive statistics for numerical columns:")?;
        writeln!(
            f,
            " {:<24} {:>10} {:>12} {:>12} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for s in &self.numeric {
            writeln!(
                f,
                " {:<24} {:>10} {:>12.4} {:>12.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                s.name, s.count, s.mean, s.std, s.min, s.p25, s.median, s.p75, s.max
            )?;
        }
        writeln!(f, "---")?;

        if !self.categorical.is_empty() {
            writeln!(f, "Descriptive statistics for non-numerical columns:")?;
            writeln!(
                f,
                " {:<24} {:>10} {:>10} {:>20} {:>10}",
                "", "count", "unique", "top", "freq"
            )?;
            for s in &self.categorical {
                writeln!(
                    f,
                    " {:<24} {:>10} {:>10} {:>20} {:>10}",
                    s.name,
                    s.count,
                    s.unique,
                    s.top.as_deref().unwrap_or("-"),
                    s.freq
                )?;
            }
            writeln!(f, "---")?;
        }
        Ok(())
    }
}
