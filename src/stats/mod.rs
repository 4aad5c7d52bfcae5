//! Stats module - Exploratory data summaries

mod calculator;

pub use calculator::{
    CategoricalStats, ColumnStats, DataFrameSummary, MissingInfo, Outliers, StatsCalculator,
    SummaryError, DEFAULT_MAX_CATEGORIES, DEFAULT_MISSING_THRESHOLD, DEFAULT_OUTLIER_THRESHOLD,
};
