use crate::BenchmarkReport;
use anyhow::Context;
use itertools::Itertools;
use parsec_logs_analysis::{AggregateRow, AggregateTable};
use parsec_logs_model::BindingMode;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// The name of the combined results file.
pub const COMBINED_CSV_FILE: &str = "combined_benchmark_results.csv";

/// A single line of the combined results file.
#[derive(Debug, Serialize)]
struct CsvRow<'row> {
    benchmark: &'row str,
    threads: u32,
    parallel_executions: u32,
    bind: &'row BindingMode,
    samples: String,
    total_time: f64,
    mean: f64,
    stddev: f64,
    cv: f64,
    baseline_time: f64,
    speedup: f64,
    efficiency: f64,
    alpha: Option<f64>,
}

impl<'row> From<&'row AggregateRow> for CsvRow<'row> {
    fn from(row: &'row AggregateRow) -> Self {
        Self {
            benchmark: &row.benchmark,
            threads: row.thread_count,
            parallel_executions: row.parallel_executions,
            bind: &row.binding_mode,
            samples: row.samples.iter().join(";"),
            total_time: row.total_time(),
            mean: row.mean(),
            stddev: row.stddev(),
            cv: row.coefficient_of_variation(),
            baseline_time: row.baseline_time,
            speedup: row.speedup,
            efficiency: row.efficiency,
            alpha: row.fitted_alpha,
        }
    }
}

/// Writes every row of the aggregate table into a single CSV file.
pub struct CombinedCsvReport<'table> {
    table: &'table AggregateTable,
}

impl<'table> CombinedCsvReport<'table> {
    pub fn new(table: &'table AggregateTable) -> Self {
        Self { table }
    }

    /// Writes the CSV to `writer`.
    pub fn write<W: std::io::Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for row in self.table.rows() {
            writer.serialize(CsvRow::from(row))?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl BenchmarkReport for CombinedCsvReport<'_> {
    fn write_results(&self, output_dir: &Path) -> anyhow::Result<()> {
        let path = output_dir.join(COMBINED_CSV_FILE);
        let file = fs::File::create(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        self.write(file)
            .with_context(|| format!("Failed to write combined results to '{}'", path.display()))?;
        debug!(path = %path.display(), rows = self.table.rows().count(), "wrote combined results");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use parsec_logs_analysis::AggregationOptions;
    use parsec_logs_model::{BindingMode, RunRecord};

    fn record(threads: u32, samples: &[f64]) -> RunRecord {
        RunRecord {
            node: "node01".to_owned(),
            benchmark_name: "foo".to_owned(),
            repetitions: 2,
            thread_count: threads,
            parallel_executions: 1,
            input_size: "native".to_owned(),
            binding_mode: BindingMode::default(),
            samples: samples.to_vec(),
            dropped_samples: 0,
        }
    }

    #[test]
    fn csv_has_one_line_per_row() {
        let table = AggregateTable::from_records(
            vec![record(1, &[4.0, 4.0]), record(2, &[2.0, 2.0]), record(4, &[])],
            &AggregationOptions::default(),
        );
        let mut buffer = Vec::new();

        CombinedCsvReport::new(&table).write(&mut buffer).unwrap();

        let csv = String::from_utf8(buffer).unwrap();
        assert_snapshot!(csv.trim_end(), @r"
        benchmark,threads,parallel_executions,bind,samples,total_time,mean,stddev,cv,baseline_time,speedup,efficiency,alpha
        foo,1,1,default,4;4,8.0,4.0,0.0,0.0,4.0,1.0,1.0,1.0
        foo,2,1,default,2;2,4.0,2.0,0.0,0.0,4.0,2.0,1.0,1.0
        foo,4,1,default,,0.0,NaN,NaN,NaN,4.0,NaN,NaN,1.0
        ");
    }
}
