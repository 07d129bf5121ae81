//! Data model shared by the parser, the aggregator and the report writers.
//!
//! A [RunRecord] is the result of parsing a single benchmark log. Records are never mutated after
//! parsing and are consumed by the aggregation step.

mod binding;
mod record;

pub use binding::BindingMode;
pub use record::RunRecord;
