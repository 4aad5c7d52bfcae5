//! Metric selection: which count drives a rendering pass.

use super::aggregator::AggregateError;
use crate::data::columns::{FATAL_COUNT, INJURY_COUNT, MCYCLE_DEATH_COUNT, PED_DEATH_COUNT};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

/// The quantity aggregated into hex bins.
///
/// Parsing accepts the display label ("Total Fatalities") or the snake-case
/// key ("total_fatalities"), ignoring ASCII case. Config files and the command
/// line both go through [`MetricSelector::parse`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(try_from = "String", into = "String")]
#[strum(ascii_case_insensitive)]
pub enum MetricSelector {
    /// Every located crash counts once.
    #[default]
    #[strum(to_string = "Total Collisions", serialize = "total_collisions")]
    TotalCollisions,
    #[strum(to_string = "Total Injured", serialize = "total_injured")]
    TotalInjured,
    #[strum(to_string = "Total Fatalities", serialize = "total_fatalities")]
    TotalFatalities,
    #[strum(to_string = "Motorcycle Fatalities", serialize = "motorcycle_fatalities")]
    MotorcycleFatalities,
    #[strum(to_string = "Pedestrian Fatalities", serialize = "pedestrian_fatalities")]
    PedestrianFatalities,
}

impl MetricSelector {
    /// Parse a label or key; anything else is an invalid parameter.
    pub fn parse(name: &str) -> Result<Self, AggregateError> {
        Self::from_str(name.trim())
            .map_err(|_| AggregateError::InvalidParameter(format!("unknown metric '{name}'")))
    }

    /// Snake-case key used in config files and output names.
    pub const fn key(self) -> &'static str {
        match self {
            Self::TotalCollisions => "total_collisions",
            Self::TotalInjured => "total_injured",
            Self::TotalFatalities => "total_fatalities",
            Self::MotorcycleFatalities => "motorcycle_fatalities",
            Self::PedestrianFatalities => "pedestrian_fatalities",
        }
    }

    /// Backing count column, or `None` for the synthetic unit count.
    pub const fn column(self) -> Option<&'static str> {
        match self {
            Self::TotalCollisions => None,
            Self::TotalInjured => Some(INJURY_COUNT),
            Self::TotalFatalities => Some(FATAL_COUNT),
            Self::MotorcycleFatalities => Some(MCYCLE_DEATH_COUNT),
            Self::PedestrianFatalities => Some(PED_DEATH_COUNT),
        }
    }

    /// Row predicate over the backing column value.
    pub fn includes(self, value: Option<i64>) -> bool {
        match self.column() {
            None => true,
            Some(_) => value.is_some_and(|v| v > 0),
        }
    }

    /// Contribution of one row to its bin.
    pub fn weight(self, value: Option<i64>) -> u64 {
        match self.column() {
            None => 1,
            Some(_) => value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0),
        }
    }
}

impl TryFrom<String> for MetricSelector {
    type Error = AggregateError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::parse(&name)
    }
}

impl From<MetricSelector> for String {
    fn from(metric: MetricSelector) -> Self {
        metric.key().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn labels_round_trip_through_parsing() {
        for metric in MetricSelector::iter() {
            let label = metric.to_string();
            assert_eq!(MetricSelector::from_str(&label).unwrap(), metric);
        }
    }

    #[test]
    fn parses_snake_case_keys() {
        assert_eq!(
            MetricSelector::from_str("pedestrian_fatalities").unwrap(),
            MetricSelector::PedestrianFatalities
        );
        assert_eq!(
            MetricSelector::from_str("TOTAL INJURED").unwrap(),
            MetricSelector::TotalInjured
        );
        assert!(MetricSelector::from_str("Bicycle Fatalities").is_err());

        let err = MetricSelector::parse("Bicycle Fatalities").unwrap_err();
        assert!(matches!(err, AggregateError::InvalidParameter(_)));
        assert!(err.to_string().contains("unknown metric 'Bicycle Fatalities'"));
    }

    #[test]
    fn keys_parse_back() {
        for metric in MetricSelector::iter() {
            assert_eq!(MetricSelector::parse(metric.key()).unwrap(), metric);
            assert_eq!(String::from(metric), metric.key());
        }
        assert_eq!(
            serde_json::to_string(&MetricSelector::MotorcycleFatalities).unwrap(),
            r#""motorcycle_fatalities""#
        );
        let parsed: MetricSelector = serde_json::from_str(r#""Total Injured""#).unwrap();
        assert_eq!(parsed, MetricSelector::TotalInjured);
    }

    #[test]
    fn collisions_count_every_row_once() {
        let metric = MetricSelector::TotalCollisions;
        assert!(metric.includes(None));
        assert!(metric.includes(Some(0)));
        assert_eq!(metric.weight(Some(7)), 1);
    }

    #[test]
    fn count_metrics_require_positive_values() {
        let metric = MetricSelector::TotalFatalities;
        assert!(!metric.includes(None));
        assert!(!metric.includes(Some(0)));
        assert!(metric.includes(Some(2)));
        assert_eq!(metric.weight(Some(2)), 2);
        assert_eq!(metric.weight(Some(-1)), 0);
    }

    #[test]
    fn every_count_metric_has_a_distinct_column() {
        let mut columns: Vec<_> = MetricSelector::iter().filter_map(|m| m.column()).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), 4);
    }
}
