//! Remaining-time estimation for an extraction run
//!
//! Linear extrapolation from elapsed time underestimates early in a run
//! whose later stages are slower, so the raw estimate is inflated by a
//! correction that decays to 1.0 as the run nears completion:
//!
//! ```text
//! raw        = elapsed * (1 - c) / c
//! correction = 1 + early_bias * (1 - c)
//! remaining  = raw * correction
//! ```
//!
//! The bias constant is an empirical smoothing heuristic, not a derived
//! quantity; it is configurable rather than load-bearing.

use crate::model::ExtractionProcess;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Tuning for the remaining-time estimate
#[derive(Debug, Clone, Copy)]
pub struct EstimatorConfig {
    /// Weight of the early-run inflation; the correction factor is
    /// `1 + early_bias * (1 - completeness)`
    pub early_bias: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self { early_bias: 2.0 }
    }
}

/// A displayable progress snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    /// Completeness fraction in [0, 1]
    pub completeness: f64,
    /// Estimated remaining wall-clock time; `None` whenever no meaningful
    /// estimate exists (zero completeness, negative or non-finite result)
    pub remaining: Option<Duration>,
}

impl ProgressReport {
    /// Percentage rendered to one decimal place, always shown
    pub fn percentage_label(&self) -> String {
        format!("{:.1}%", self.completeness * 100.0)
    }

    /// Remaining time decomposed into h/m/s, or `None` when unknown
    ///
    /// A zero-valued hours unit is omitted; minutes are kept whenever
    /// hours are shown so "1h 0m 5s" never reads as "1h 5s"; seconds are
    /// always present, so the string is never empty.
    pub fn remaining_label(&self) -> Option<String> {
        self.remaining.map(format_remaining)
    }
}

/// Estimate progress for a process at display time `now`
pub fn estimate(
    process: &ExtractionProcess,
    now: DateTime<Utc>,
    config: &EstimatorConfig,
) -> ProgressReport {
    let completeness = process.completeness_fraction();
    let report = ProgressReport {
        completeness,
        remaining: None,
    };

    let Some(requested_at) = process.requested_at else {
        return report;
    };
    if completeness <= 0.0 {
        return report;
    }
    let elapsed_ms = (now - requested_at).num_milliseconds();
    if elapsed_ms <= 0 {
        return report;
    }

    let raw = elapsed_ms as f64 * (1.0 - completeness) / completeness;
    let correction = 1.0 + config.early_bias * (1.0 - completeness);
    let remaining_ms = raw * correction;
    if !remaining_ms.is_finite() || remaining_ms <= 0.0 {
        return report;
    }

    ProgressReport {
        completeness,
        // Round to the millisecond first: binary fractions land a hair
        // under exact values and would floor 120.0s down to 1m 59s.
        remaining: Some(Duration::from_millis(remaining_ms.round() as u64)),
    }
}

fn format_remaining(remaining: Duration) -> String {
    let total_ms = remaining.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1_000;

    let mut label = String::new();
    if hours != 0 {
        label.push_str(&format!("{}h ", hours));
    }
    if hours != 0 || minutes != 0 {
        label.push_str(&format!("{}m ", minutes));
    }
    label.push_str(&format!("{}s", seconds));
    label
}
