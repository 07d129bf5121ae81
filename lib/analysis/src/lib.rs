//! Aggregates [RunRecord](parsec_logs_model::RunRecord)s into per-thread-count statistics.
//!
//! Records are merged into rows keyed by benchmark, binding mode and thread count. Rows that share
//! a benchmark and a binding mode form a group. Speedup and efficiency are computed relative to
//! the first row of each group and an Amdahl's-Law model is fitted per group.

mod aggregate;
pub mod amdahl;
mod stats;

pub use aggregate::{
    AggregateGroup, AggregateRow, AggregateTable, AggregationOptions,
    DEFAULT_BASELINE_SCALING,
};
pub use amdahl::{AmdahlFit, FitFailure, FitOutcome, FitWindow};
pub use stats::SampleStatistics;
