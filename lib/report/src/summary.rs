use crate::format::{fixed, percent, PLACEHOLDER};
use crate::BenchmarkReport;
use anyhow::Context;
use parsec_logs_analysis::AggregateTable;
use prettytable::{row, Table};
use std::fs;
use std::io::Write;
use std::path::Path;

/// The name of the plain-text summary file.
pub const SUMMARY_FILE: &str = "summary.txt";

/// A plain-text overview of all rows, intended for a quick look at the terminal.
pub struct SummaryReport<'table> {
    table: &'table AggregateTable,
}

impl<'table> SummaryReport<'table> {
    pub fn new(table: &'table AggregateTable) -> Self {
        Self { table }
    }

    /// Builds the summary table.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(row![
            "Benchmark",
            "Bind",
            "Threads",
            "Samples",
            "Dropped",
            "Mean (s)",
            "CV (%)",
            "Speedup",
            "Efficiency",
            "Alpha"
        ]);
        for entry in self.table.rows() {
            let alpha = entry
                .fitted_alpha
                .map_or_else(|| PLACEHOLDER.to_owned(), |alpha| fixed(alpha, 3));
            table.add_row(row![
                entry.benchmark,
                entry.binding_mode,
                entry.thread_count,
                entry.samples.len(),
                entry.dropped_samples,
                fixed(entry.mean(), 3),
                percent(entry.coefficient_of_variation()),
                fixed(entry.speedup, 2),
                fixed(entry.efficiency, 2),
                alpha
            ]);
        }
        table
    }

    /// Writes a tabular summary to `writer`.
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> anyhow::Result<()> {
        self.to_table().print(writer)?;
        Ok(())
    }
}

impl BenchmarkReport for SummaryReport<'_> {
    fn write_results(&self, output_dir: &Path) -> anyhow::Result<()> {
        let path = output_dir.join(SUMMARY_FILE);
        let mut file = fs::File::create(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        self.write(&mut file).context("Cannot write summary")
    }
}
