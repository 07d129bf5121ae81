//! Turns the raw text log of a single benchmark run into a [RunRecord].
//!
//! The log format is produced by the benchmark harness:
//!
//! ```text
//! node042
//! Testing blackscholes 3 times on 8 cores with 1 parallel executions using input size:native and OMP_PROC_BIND: close
//! ... COMPUTETIME: 1543210 ...
//! real    0m1.612s
//! ```
//!
//! The line grammar lives in [grammar] and can be used without the parser.

mod error;
pub mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::{LogParser, ParserOptions};

pub use parsec_logs_model::RunRecord;
