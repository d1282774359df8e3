//! Extraction process status and its derived lifecycle state

use super::book::BookId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status record of a book's entity-extraction job
///
/// One per book, created implicitly server-side on first status query.
/// The server is the only writer; the client reads and derives
/// [`ProcessState`] from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionProcess {
    /// Owning book
    pub book_id: BookId,
    /// Whether the job was ever triggered
    pub is_requested: bool,
    /// Cost quoted before triggering, in service credits
    #[serde(default)]
    pub estimated_cost: f64,
    /// When the job was triggered; set once, stable for the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
    /// Fraction of narrative parts processed, in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completeness: Option<f64>,
}

impl ExtractionProcess {
    /// A process that has never been triggered
    pub fn unrequested(book_id: BookId) -> Self {
        Self {
            book_id,
            is_requested: false,
            estimated_cost: 0.0,
            requested_at: None,
            completeness: None,
        }
    }

    /// Completeness with the unreported default applied and clamped to [0, 1]
    pub fn completeness_fraction(&self) -> f64 {
        self.completeness.unwrap_or(0.0).clamp(0.0, 1.0)
    }

    /// Derive the lifecycle state from the raw record
    pub fn state(&self) -> ProcessState {
        if !self.is_requested || self.requested_at.is_none() {
            return ProcessState::Unrequested;
        }
        let c = self.completeness_fraction();
        if c <= 0.0 {
            ProcessState::Requested
        } else if c < 1.0 {
            ProcessState::InProgress
        } else {
            ProcessState::Complete
        }
    }
}

/// Lifecycle state of an extraction job
///
/// `Complete` is terminal: once reached, polling for the resource stops
/// permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Never triggered
    Unrequested,
    /// Triggered, no parts processed yet
    Requested,
    /// Some but not all parts processed
    InProgress,
    /// All parts processed
    Complete,
}

impl ProcessState {
    /// Whether the state admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Complete)
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ProcessState::Unrequested => "unrequested",
            ProcessState::Requested => "requested",
            ProcessState::InProgress => "in progress",
            ProcessState::Complete => "complete",
        };
        write!(f, "{}", label)
    }
}
