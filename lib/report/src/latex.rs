use crate::format::{escape_latex, fixed, hours_minutes, percent, PLACEHOLDER};
use crate::BenchmarkReport;
use anyhow::Context;
use parsec_logs_analysis::{AggregateGroup, AggregateRow};
use std::collections::BTreeSet;
use std::fmt::Write;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A single `booktabs` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatexTable {
    caption: String,
    label: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LatexTable {
    /// Appends the LaTeX source of this table to `out`.
    pub fn render(&self, out: &mut String) -> std::fmt::Result {
        let columns = "r".repeat(self.header.len().max(1));
        writeln!(out, r"\begin{{table}}[htbp]")?;
        writeln!(out, r"  \centering")?;
        writeln!(out, r"  \caption{{{}}}", self.caption)?;
        writeln!(out, r"  \label{{{}}}", self.label)?;
        writeln!(out, r"  \begin{{tabular}}{{{columns}}}")?;
        writeln!(out, r"    \toprule")?;
        writeln!(out, r"    {} \\", self.header.join(" & "))?;
        writeln!(out, r"    \midrule")?;
        for row in &self.rows {
            writeln!(out, r"    {} \\", row.join(" & "))?;
        }
        writeln!(out, r"    \bottomrule")?;
        writeln!(out, r"  \end{{tabular}}")?;
        writeln!(out, r"\end{{table}}")
    }
}

/// The LaTeX tables of a single benchmark.
///
/// Summary tables have one row per thread count and one column per binding mode. Raw-time tables
/// have one row per thread count and one column per run.
pub struct BenchmarkTables<'table> {
    benchmark: &'table str,
    groups: Vec<&'table AggregateGroup>,
    raw_times: bool,
}

impl<'table> BenchmarkTables<'table> {
    /// Creates the tables for `benchmark` from its `groups`.
    pub fn new(
        benchmark: &'table str,
        groups: Vec<&'table AggregateGroup>,
        raw_times: bool,
    ) -> Self {
        Self {
            benchmark,
            groups,
            raw_times,
        }
    }

    /// Returns the file name of the rendered tables.
    pub fn file_name(&self) -> String {
        format!("{}_table.tex", self.benchmark)
    }

    /// Builds all tables in document order.
    pub fn tables(&self) -> Vec<LatexTable> {
        if self.groups.is_empty() {
            return Vec::new();
        }

        let mut tables = vec![
            self.pivot("wall time (HH:MM)", "time", |row| hours_minutes(row.mean())),
            self.pivot(r"coefficient of variation (\%)", "cv", |row| {
                percent(row.coefficient_of_variation())
            }),
            self.pivot("speedup", "speedup", |row| fixed(row.speedup, 2)),
            self.pivot("efficiency", "efficiency", |row| fixed(row.efficiency, 2)),
        ];
        if self.raw_times {
            tables.extend(self.groups.iter().map(|group| self.raw_time_table(group)));
        }
        tables
    }

    /// Renders the whole `.tex` file.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "% Benchmark results for {}", self.benchmark)?;
        for table in self.tables() {
            writeln!(out)?;
            table.render(&mut out)?;
        }
        Ok(out)
    }

    fn pivot(
        &self,
        caption: &str,
        label: &str,
        cell: impl Fn(&AggregateRow) -> String,
    ) -> LatexTable {
        let thread_counts = self
            .groups
            .iter()
            .flat_map(|group| group.rows().iter().map(|row| row.thread_count))
            .collect::<BTreeSet<_>>();

        let header = std::iter::once("Threads".to_owned())
            .chain(
                self.groups
                    .iter()
                    .map(|group| escape_latex(group.binding_mode().as_str())),
            )
            .collect();
        let rows = thread_counts
            .into_iter()
            .map(|threads| {
                std::iter::once(threads.to_string())
                    .chain(self.groups.iter().map(|group| {
                        group
                            .rows()
                            .iter()
                            .find(|row| row.thread_count == threads)
                            .map_or_else(|| PLACEHOLDER.to_owned(), &cell)
                    }))
                    .collect()
            })
            .collect();

        LatexTable {
            caption: format!("{}: {caption}", escape_latex(self.benchmark)),
            label: format!("tab:{}-{label}", self.benchmark),
            header,
            rows,
        }
    }

    fn raw_time_table(&self, group: &AggregateGroup) -> LatexTable {
        let runs = group
            .rows()
            .iter()
            .map(|row| row.samples.len())
            .max()
            .unwrap_or(0)
            .max(1);

        let header = std::iter::once("Threads".to_owned())
            .chain((1..=runs).map(|run| format!("Run {run}")))
            .collect();
        let rows = group
            .rows()
            .iter()
            .map(|row| {
                std::iter::once(row.thread_count.to_string())
                    .chain((0..runs).map(|run| {
                        row.samples
                            .get(run)
                            .map_or_else(|| PLACEHOLDER.to_owned(), |s| fixed(*s, 2))
                    }))
                    .collect()
            })
            .collect();

        let bind = group.binding_mode().as_str();
        LatexTable {
            caption: format!(
                r"{}: time per run in seconds, OMP\_PROC\_BIND={}",
                escape_latex(self.benchmark),
                escape_latex(bind)
            ),
            label: format!("tab:{}-raw-{bind}", self.benchmark),
            header,
            rows,
        }
    }
}

impl BenchmarkReport for BenchmarkTables<'_> {
    fn write_results(&self, output_dir: &Path) -> anyhow::Result<()> {
        if self.groups.is_empty() {
            return Ok(());
        }

        let path = output_dir.join(self.file_name());
        let content = self
            .render()
            .context("Cannot render LaTeX tables")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write LaTeX tables to '{}'", path.display()))?;
        debug!(path = %path.display(), "wrote LaTeX tables");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use parsec_logs_analysis::{AggregateTable, AggregationOptions};
    use parsec_logs_model::{BindingMode, RunRecord};

    fn record(bind: &str, threads: u32, samples: &[f64]) -> RunRecord {
        RunRecord {
            node: "node01".to_owned(),
            benchmark_name: "my_bench".to_owned(),
            repetitions: 2,
            thread_count: threads,
            parallel_executions: 1,
            input_size: "native".to_owned(),
            binding_mode: BindingMode::from_capture(Some(bind)),
            samples: samples.to_vec(),
            dropped_samples: 0,
        }
    }

    fn table() -> AggregateTable {
        AggregateTable::from_records(
            vec![
                record("close", 1, &[60.0, 60.0]),
                record("close", 2, &[]),
                record("spread", 2, &[30.0, 31.0, 29.0]),
            ],
            &AggregationOptions::default(),
        )
    }

    #[test]
    fn wall_time_table() {
        let table = table();
        let tables = BenchmarkTables::new("my_bench", table.groups_of("my_bench").collect(), true);

        let mut out = String::new();
        tables.tables()[0].render(&mut out).unwrap();

        assert_snapshot!(out.trim_end(), @r"
        \begin{table}[htbp]
          \centering
          \caption{my\_bench: wall time (HH:MM)}
          \label{tab:my_bench-time}
          \begin{tabular}{rrr}
            \toprule
            Threads & close & spread \\
            \midrule
            1 & 00:01 & -- \\
            2 & -- & 00:01 \\
            \bottomrule
          \end{tabular}
        \end{table}
        ");
    }

    #[test]
    fn undefined_cells_are_placeholders() {
        let table = table();
        let tables = BenchmarkTables::new("my_bench", table.groups_of("my_bench").collect(), true);

        let speedup = &tables.tables()[2];

        assert_eq!(speedup.rows[0], vec!["1", "1.00", "--"]);
        assert_eq!(speedup.rows[1], vec!["2", "--", "1.60"]);
    }

    #[test]
    fn raw_time_tables_per_binding_mode() {
        let table = table();
        let groups = table.groups_of("my_bench").collect::<Vec<_>>();

        let with_raw = BenchmarkTables::new("my_bench", groups.clone(), true).tables();
        let without_raw = BenchmarkTables::new("my_bench", groups, false).tables();

        assert_eq!(with_raw.len(), 6);
        assert_eq!(without_raw.len(), 4);
        let spread = &with_raw[5];
        assert_eq!(spread.header, vec!["Threads", "Run 1", "Run 2", "Run 3"]);
        assert_eq!(spread.rows, vec![vec!["2", "30.00", "31.00", "29.00"]]);
        let close = &with_raw[4];
        assert_eq!(close.rows[1], vec!["2", "--", "--"]);
    }

    #[test]
    fn benchmark_without_groups_writes_nothing() {
        let dir = assert_fs::TempDir::new().unwrap();
        let tables = BenchmarkTables::new("missing", Vec::new(), true);

        tables.write_results(dir.path()).unwrap();

        assert!(!dir.path().join("missing_table.tex").exists());
    }

    #[test]
    fn tables_are_written() {
        let dir = assert_fs::TempDir::new().unwrap();
        let table = table();
        let tables = BenchmarkTables::new("my_bench", table.groups_of("my_bench").collect(), true);

        tables.write_results(dir.path()).unwrap();

        let content = fs::read_to_string(dir.path().join("my_bench_table.tex")).unwrap();
        assert!(content.starts_with("% Benchmark results for my_bench\n"));
        assert_eq!(content.matches(r"\begin{table}").count(), 6);
    }
}
