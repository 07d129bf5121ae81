//! Renders an [AggregateTable] into files.
//!
//! - `combined_benchmark_results.csv` with every row of the table.
//! - `summary.txt` with a plain-text overview.
//! - `<benchmark>_table.tex` with LaTeX tables per benchmark.
//! - `<benchmark>_{speedup,eff,time}_plot.svg` with plots per benchmark.

mod csv;
pub mod format;
mod latex;
mod plots;
mod report;
mod summary;

pub use crate::csv::{CombinedCsvReport, COMBINED_CSV_FILE};
pub use latex::{BenchmarkTables, LatexTable};
pub use plots::{BenchmarkPlots, PlotKind};
pub use report::BenchmarkReport;
pub use summary::{SummaryReport, SUMMARY_FILE};

use anyhow::Context;
use parsec_logs_analysis::AggregateTable;
use std::fs;
use std::path::Path;
use tracing::info;

/// Provides options for the generated reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportOptions {
    /// Indicates whether SVG plots should be rendered.
    pub plots: bool,
    /// Indicates whether the LaTeX output contains the time of every single run.
    pub raw_times: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            plots: true,
            raw_times: true,
        }
    }
}

/// Writes all reports for `table` into `output_dir`, creating the directory if necessary.
pub fn write_reports(
    table: &AggregateTable,
    output_dir: &Path,
    options: &ReportOptions,
) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir).with_context(|| {
        format!("Cannot create output directory '{}'", output_dir.display())
    })?;

    let mut reports: Vec<Box<dyn BenchmarkReport + '_>> = vec![
        Box::new(CombinedCsvReport::new(table)),
        Box::new(SummaryReport::new(table)),
    ];
    for benchmark in table.benchmarks() {
        let groups = table.groups_of(benchmark).collect::<Vec<_>>();
        if options.plots {
            reports.push(Box::new(BenchmarkPlots::new(benchmark, groups.clone())));
        }
        reports.push(Box::new(BenchmarkTables::new(
            benchmark,
            groups,
            options.raw_times,
        )));
    }

    for report in reports {
        report.write_results(output_dir)?;
    }
    info!(
        output_dir = %output_dir.display(),
        benchmarks = table.benchmarks().len(),
        rows = table.rows().count(),
        "reports written"
    );
    Ok(())
}
