//! Fabula: Book Narrative-Analysis Client Engine
//!
//! A typed client engine for a book entity-extraction service: it models a
//! book's structural parts as a navigable tree, persists narrative
//! classification with optimistic updates, tracks the long-running
//! extraction job with a polling state machine and remaining-time
//! estimation, and ranks the extracted entities by their supporting
//! evidence.
//!
//! # Core Concepts
//!
//! - **Part tree**: arena-backed table of contents built from flat records
//! - **Classification**: per-part narrative flags, explicit-target updates
//! - **Tracker**: cancellable polling over the extraction job lifecycle
//! - **Rollup**: per-entity, per-part evidence grouping and ranking
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fabula::{FabulaApi, HttpBookService};
//!
//! let service = HttpBookService::new("https://api.example.com", "token");
//! let api = FabulaApi::new(Arc::new(service));
//! // API is ready for use
//! ```

mod api;
pub mod client;
pub mod config;
pub mod entities;
mod model;
pub mod session;
pub mod toc;
pub mod tracker;

pub use api::{FabulaApi, FabulaError, FabulaResult};
pub use client::{ApiError, ApiResult, BookService, HttpBookService};
pub use entities::{aggregate, EntityFilter, EntityRollup, PartFacts};
pub use model::{
    Book, BookId, BookPart, Entity, EntityCategory, ExtractionProcess, Fact, PartId,
    ProcessState, TocPart,
};
pub use session::{ResourceKind, Session};
pub use toc::{Classifier, HierarchyError, PartArena, PreviewCache, ToggleOutcome, ToggleState};
pub use tracker::{
    estimate, CancelToken, EstimatorConfig, ExtractionTracker, ProgressReport, TrackerConfig,
    TrackerError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
