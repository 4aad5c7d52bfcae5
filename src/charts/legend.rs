//! Legend: numeric class edges over the bin value range, one color per class.

use super::palette::{ColorScheme, Rgba};
use crate::hex::{HexAggregation, ValueRange};
use std::fmt::Write;

/// `n + 1` evenly spaced edges from `range.min` to `range.max`.
///
/// A zero-width range gives `n + 1` copies of the single value.
pub fn legend_edges(range: ValueRange, n: usize) -> Vec<f64> {
    if n == 0 {
        return vec![range.min];
    }
    let step = range.width().max(0.0) / n as f64;
    (0..=n)
        .map(|i| {
            if i == n {
                range.max.max(range.min)
            } else {
                range.min + step * i as f64
            }
        })
        .collect()
}

/// One legend row: values in `[lower, upper]` are drawn with `color`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendEntry {
    pub lower: f64,
    pub upper: f64,
    pub color: Rgba,
}

impl LegendEntry {
    pub fn label(&self) -> String {
        format!("{} - {}", format_value(self.lower), format_value(self.upper))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub title: String,
    pub range: ValueRange,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    /// Pair consecutive edges with the scheme's colors by index.
    pub fn new(range: ValueRange, scheme: &ColorScheme) -> Self {
        let edges = legend_edges(range, scheme.len());
        let entries = edges
            .windows(2)
            .zip(scheme.colors())
            .map(|(pair, &color)| LegendEntry {
                lower: pair[0],
                upper: pair[1],
                color,
            })
            .collect();
        Self {
            title: String::new(),
            range,
            entries,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Legend for a pass, or `None` when the pass produced no bins.
    pub fn from_aggregation(aggregation: &HexAggregation, scheme: &ColorScheme) -> Option<Self> {
        let range = aggregation.value_range?;
        Some(Self::new(range, scheme).with_title(aggregation.metric.to_string()))
    }

    /// Class boundaries, one more than the number of entries.
    pub fn edges(&self) -> Vec<f64> {
        let mut edges: Vec<f64> = self.entries.iter().map(|e| e.lower).collect();
        if let Some(last) = self.entries.last() {
            edges.push(last.upper);
        }
        edges
    }

    /// Overlay markup: a dark box with one swatch per class, the class
    /// ranges as tooltips and Low/High captions.
    pub fn to_html(&self) -> String {
        let mut html = String::from(
            "<div class=\"crash-legend\" style=\"position: absolute; top: 40px; right: 50px; \
             background-color: rgba(0, 0, 0, 0.7); padding: 5px 5px 0px 5px; \
             border-radius: 5px; z-index: 999; color: white; font-family: sans-serif;\">\n",
        );
        if !self.title.is_empty() {
            let _ = writeln!(
                html,
                "  <div style=\"font-size: 0.8em; margin-bottom: 4px;\">{}</div>",
                escape_html(&self.title)
            );
        }
        html.push_str("  <div style=\"display: flex; align-items: center; gap: 2px;\">\n");
        for entry in &self.entries {
            let _ = writeln!(
                html,
                "    <div title=\"{}\" style=\"background-color: {}; width: 20px; height: 10px;\"></div>",
                entry.label(),
                entry.color.to_css()
            );
        }
        html.push_str("  </div>\n");
        let _ = writeln!(
            html,
            "  <p style=\"font-size: 0.7em; margin: 2px 0 4px 0;\">Low ({}) \
             <span style=\"float: right;\">High ({})</span></p>",
            format_value(self.range.min),
            format_value(self.range.max)
        );
        html.push_str("</div>\n");
        html
    }
}

/// Whole numbers without decimals, everything else with one.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
