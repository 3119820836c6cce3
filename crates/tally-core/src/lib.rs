//! Tally Core Library
//!
//! Derived financial-behavior metrics for individuals, computed from a
//! ledger of dated, categorized transactions:
//! - Structural validation gating analysis (whole-dataset accept/reject)
//! - Spending metrics: totals, averages, per-day rates
//! - Budget utilization and its five-band classification
//! - Category aggregation with deterministic ranking
//! - Timeline reduction with highest/lowest spending days
//! - Plain-text summary rendering for narrative generation
//!
//! The library is a pure, synchronous transform from structured input to
//! structured output. Loading datasets from disk, calling text-generation
//! services, and rendering reports are all caller concerns; the only
//! contact surfaces are the JSON-shaped ingestion boundary and the
//! [`narrative::NarrativeBackend`] trait.

pub mod error;
pub mod metrics;
pub mod models;
pub mod narrative;
pub mod summary;
pub mod validate;

pub use error::{Error, Result, ValidationError};
pub use metrics::{
    analyze, analyze_all, analyze_record, BudgetAnalysis, BudgetStatus, CategorySpend, DailySpend,
    MetricsResult, SpendingMetrics, TimelineAnalysis,
};
pub use models::{Dataset, PersonRecord, Transaction};
pub use narrative::{MockBackend, Narrative, NarrativeBackend};
pub use validate::{validate, RawDataset, RawPersonRecord, RawTransaction};
