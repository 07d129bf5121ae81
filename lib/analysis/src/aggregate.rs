use crate::amdahl::{fit_amdahl, FitOutcome, FitWindow};
use crate::SampleStatistics;
use itertools::Itertools;
use parsec_logs_model::{BindingMode, RunRecord};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// The default factor applied to the thread count of a group's baseline row.
pub const DEFAULT_BASELINE_SCALING: f64 = 0.8;

/// Provides options for the aggregation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregationOptions {
    /// The baseline time of a group is the mean of its first row multiplied by
    /// `max(thread_count * baseline_scaling, 1)`.
    ///
    /// The scaling approximates the sequential time of baselines that were not executed on a
    /// single thread. A value of `1.0` uses the raw thread count.
    pub baseline_scaling: f64,
    /// The points of each group that take part in the Amdahl fit.
    pub fit_window: FitWindow,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            baseline_scaling: DEFAULT_BASELINE_SCALING,
            fit_window: FitWindow::All,
        }
    }
}

/// Identifies a group of rows.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct GroupKey {
    pub benchmark: String,
    pub binding_mode: BindingMode,
}

/// The aggregated measurements of one benchmark, binding mode and thread count.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateRow {
    pub benchmark: String,
    pub binding_mode: BindingMode,
    pub thread_count: u32,
    /// Parallel executions of the first record that contributed to this row.
    pub parallel_executions: u32,
    /// The samples of all contributing records in input order.
    pub samples: Vec<f64>,
    pub dropped_samples: u32,
    pub statistics: SampleStatistics,
    pub baseline_time: f64,
    pub speedup: f64,
    pub efficiency: f64,
    /// The parallel fraction fitted for the row's group.
    pub fitted_alpha: Option<f64>,
}

impl AggregateRow {
    pub fn mean(&self) -> f64 {
        self.statistics.mean
    }

    pub fn stddev(&self) -> f64 {
        self.statistics.stddev
    }

    pub fn coefficient_of_variation(&self) -> f64 {
        self.statistics.coefficient_of_variation()
    }

    /// Returns the sum of all samples, `0.0` for a row without samples.
    pub fn total_time(&self) -> f64 {
        self.samples.iter().fold(0.0, |total, sample| total + sample)
    }

    /// Returns the standard deviation of the speedup, propagated from the relative standard
    /// deviation of the measured time.
    pub fn speedup_stddev(&self) -> f64 {
        self.speedup * self.coefficient_of_variation()
    }
}

/// All rows of one benchmark and binding mode, ordered by ascending thread count.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateGroup {
    key: GroupKey,
    rows: Vec<AggregateRow>,
    fit: FitOutcome,
}

impl AggregateGroup {
    pub fn benchmark(&self) -> &str {
        &self.key.benchmark
    }

    pub fn binding_mode(&self) -> &BindingMode {
        &self.key.binding_mode
    }

    /// Returns the rows, ordered by ascending thread count. Never empty.
    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    pub fn fit(&self) -> &FitOutcome {
        &self.fit
    }

    /// Returns the speedup denominator shared by all rows.
    pub fn baseline_time(&self) -> f64 {
        self.rows.first().map_or(f64::NAN, |row| row.baseline_time)
    }

    fn build(
        key: GroupKey,
        builders: BTreeMap<u32, RowBuilder>,
        options: &AggregationOptions,
    ) -> Self {
        let mut rows = builders
            .into_iter()
            .map(|(thread_count, builder)| {
                let statistics = SampleStatistics::from_samples(&builder.samples);
                AggregateRow {
                    benchmark: key.benchmark.clone(),
                    binding_mode: key.binding_mode.clone(),
                    thread_count,
                    parallel_executions: builder.parallel_executions,
                    samples: builder.samples,
                    dropped_samples: builder.dropped_samples,
                    statistics,
                    baseline_time: f64::NAN,
                    speedup: f64::NAN,
                    efficiency: f64::NAN,
                    fitted_alpha: None,
                }
            })
            .collect::<Vec<_>>();

        let baseline_time = rows.first().map_or(f64::NAN, |first| {
            let scale = (f64::from(first.thread_count) * options.baseline_scaling).max(1.0);
            first.mean() * scale
        });
        for row in &mut rows {
            row.baseline_time = baseline_time;
            row.speedup = baseline_time / row.mean();
            row.efficiency = row.speedup / f64::from(row.thread_count);
        }

        let points = options
            .fit_window
            .apply(&rows)
            .iter()
            .map(|row| (f64::from(row.thread_count), row.speedup))
            .collect::<Vec<_>>();
        let fit = fit_amdahl(&points);
        match &fit {
            FitOutcome::Fitted(fit) => debug!(
                benchmark = %key.benchmark,
                bind = %key.binding_mode,
                alpha = fit.alpha,
                residual = fit.residual,
                "fitted Amdahl's Law"
            ),
            FitOutcome::Skipped(reason) => info!(
                benchmark = %key.benchmark,
                bind = %key.binding_mode,
                %reason,
                "skipping Amdahl fit"
            ),
        }
        for row in &mut rows {
            row.fitted_alpha = fit.alpha();
        }

        Self { key, rows, fit }
    }
}

/// Collects the samples of all records with the same key.
struct RowBuilder {
    parallel_executions: u32,
    samples: Vec<f64>,
    dropped_samples: u32,
}

/// The aggregate table over a batch of records.
///
/// Groups are ordered by benchmark and binding mode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateTable {
    groups: Vec<AggregateGroup>,
}

impl AggregateTable {
    /// Aggregates `records`. Records with the same benchmark, binding mode and thread count are
    /// merged into a single row.
    pub fn from_records(
        records: impl IntoIterator<Item = RunRecord>,
        options: &AggregationOptions,
    ) -> Self {
        let mut builders: BTreeMap<GroupKey, BTreeMap<u32, RowBuilder>> = BTreeMap::new();
        for record in records {
            if !record.has_samples() {
                info!(
                    node = %record.node,
                    benchmark = %record.benchmark_name,
                    threads = record.thread_count,
                    "log contains no timing samples"
                );
            }
            let key = GroupKey {
                benchmark: record.benchmark_name,
                binding_mode: record.binding_mode,
            };
            let group = builders.entry(key).or_default();
            match group.get_mut(&record.thread_count) {
                Some(builder) => {
                    if builder.parallel_executions != record.parallel_executions {
                        warn!(
                            node = %record.node,
                            threads = record.thread_count,
                            expected = builder.parallel_executions,
                            found = record.parallel_executions,
                            "merging runs with different parallel executions"
                        );
                    }
                    builder.samples.extend(record.samples);
                    builder.dropped_samples += record.dropped_samples;
                }
                None => {
                    group.insert(
                        record.thread_count,
                        RowBuilder {
                            parallel_executions: record.parallel_executions,
                            samples: record.samples,
                            dropped_samples: record.dropped_samples,
                        },
                    );
                }
            }
        }

        let groups = builders
            .into_iter()
            .map(|(key, rows)| AggregateGroup::build(key, rows, options))
            .collect();
        Self { groups }
    }

    pub fn groups(&self) -> &[AggregateGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns all rows, ordered by group and thread count.
    pub fn rows(&self) -> impl Iterator<Item = &AggregateRow> {
        self.groups.iter().flat_map(|group| group.rows.iter())
    }

    /// Returns the distinct benchmark names in table order.
    pub fn benchmarks(&self) -> Vec<&str> {
        self.groups
            .iter()
            .map(AggregateGroup::benchmark)
            .dedup()
            .collect()
    }

    /// Returns the groups of `benchmark`, ordered by binding mode.
    pub fn groups_of<'table>(
        &'table self,
        benchmark: &'table str,
    ) -> impl Iterator<Item = &'table AggregateGroup> {
        self.groups
            .iter()
            .filter(move |group| group.benchmark() == benchmark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn record(benchmark: &str, bind: Option<&str>, threads: u32, samples: &[f64]) -> RunRecord {
        RunRecord {
            node: "node01".to_owned(),
            benchmark_name: benchmark.to_owned(),
            repetitions: u32::try_from(samples.len()).unwrap(),
            thread_count: threads,
            parallel_executions: 1,
            input_size: "native".to_owned(),
            binding_mode: BindingMode::from_capture(bind),
            samples: samples.to_vec(),
            dropped_samples: 0,
        }
    }

    fn ideal_records() -> Vec<RunRecord> {
        vec![
            record("foo", Some("close"), 4, &[2.0, 2.0]),
            record("foo", Some("close"), 1, &[7.5, 8.5]),
            record("foo", Some("close"), 8, &[1.0, 1.0]),
            record("foo", Some("close"), 2, &[4.0, 4.0]),
        ]
    }

    #[test]
    fn rows_are_ordered_by_thread_count() {
        let table = AggregateTable::from_records(ideal_records(), &AggregationOptions::default());

        let threads = table.rows().map(|r| r.thread_count).collect::<Vec<_>>();
        assert_eq!(threads, vec![1, 2, 4, 8]);
        assert_eq!(table.groups().len(), 1);
    }

    #[test]
    fn ideal_scaling_has_increasing_speedup() {
        let table = AggregateTable::from_records(ideal_records(), &AggregationOptions::default());
        let rows = table.rows().collect::<Vec<_>>();

        for pair in rows.windows(2) {
            assert!(pair[1].speedup > pair[0].speedup);
        }
        for row in &rows {
            assert!(row.efficiency <= 1.0 + 1e-12, "efficiency = {}", row.efficiency);
        }
        assert_eq!(rows[0].speedup, 1.0);
        assert_eq!(rows[3].speedup, 8.0);
    }

    #[test]
    fn baseline_is_scaled_by_thread_count() {
        let records = vec![
            record("foo", None, 4, &[10.0]),
            record("foo", None, 8, &[5.0]),
        ];
        let table = AggregateTable::from_records(records, &AggregationOptions::default());
        let group = &table.groups()[0];

        assert!((group.baseline_time() - 32.0).abs() < 1e-12);
        assert!((group.rows()[1].speedup - 6.4).abs() < 1e-12);
        assert!((group.rows()[1].efficiency - 0.8).abs() < 1e-12);

        let raw = AggregationOptions {
            baseline_scaling: 1.0,
            ..AggregationOptions::default()
        };
        let table = AggregateTable::from_records(
            vec![
                record("foo", None, 4, &[10.0]),
                record("foo", None, 8, &[5.0]),
            ],
            &raw,
        );
        assert_eq!(table.groups()[0].baseline_time(), 40.0);
    }

    #[test]
    fn single_threaded_baseline_is_not_scaled_down() {
        let table = AggregateTable::from_records(
            vec![record("foo", None, 1, &[10.0]), record("foo", None, 2, &[5.0])],
            &AggregationOptions::default(),
        );

        assert_eq!(table.groups()[0].baseline_time(), 10.0);
    }

    #[test]
    fn default_binding_groups_across_files() {
        let records = vec![
            record("foo", None, 1, &[4.0]),
            record("foo", Some("default"), 2, &[2.0]),
            record("foo", Some("spread"), 1, &[4.0]),
        ];

        let table = AggregateTable::from_records(records, &AggregationOptions::default());

        let keys = table
            .groups()
            .iter()
            .map(|g| (g.binding_mode().as_str(), g.rows().len()))
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![("default", 2), ("spread", 1)]);
    }

    #[test]
    fn records_with_same_key_are_merged_in_order() {
        let records = vec![
            record("foo", None, 2, &[3.0, 1.0]),
            record("bar", None, 2, &[9.0]),
            record("foo", None, 2, &[2.0]),
        ];

        let table = AggregateTable::from_records(records, &AggregationOptions::default());

        assert_eq!(table.benchmarks(), vec!["bar", "foo"]);
        let foo = table.groups_of("foo").next().unwrap();
        assert_eq!(foo.rows()[0].samples, vec![3.0, 1.0, 2.0]);
        assert_eq!(foo.rows()[0].total_time(), 6.0);
    }

    #[test]
    fn empty_samples_yield_undefined_statistics() {
        let records = vec![record("foo", None, 1, &[4.0, 4.0]), record("foo", None, 2, &[])];

        let table = AggregateTable::from_records(records, &AggregationOptions::default());
        let row = &table.groups()[0].rows()[1];

        assert!(row.mean().is_nan());
        assert!(row.stddev().is_nan());
        assert!(row.coefficient_of_variation().is_nan());
        assert!(row.speedup.is_nan());
        assert!(row.efficiency.is_nan());
        assert_eq!(row.total_time(), 0.0);
        assert!(row.total_time().is_sign_positive());
    }

    #[test]
    fn fit_is_attached_to_rows() {
        let table = AggregateTable::from_records(ideal_records(), &AggregationOptions::default());
        let group = &table.groups()[0];

        let alpha = group.fit().alpha().unwrap();
        assert!((0.0..=1.0).contains(&alpha));
        assert!(alpha > 0.99);
        assert!(group.rows().iter().all(|r| r.fitted_alpha == Some(alpha)));
    }

    #[test]
    fn single_thread_count_group_skips_fit() {
        let table = AggregateTable::from_records(
            vec![record("foo", None, 8, &[1.0, 2.0])],
            &AggregationOptions::default(),
        );
        let group = &table.groups()[0];

        assert_eq!(
            group.fit(),
            &FitOutcome::Skipped(crate::FitFailure::SingleThreadCount)
        );
        assert_eq!(group.rows()[0].fitted_alpha, None);
    }

    #[test]
    fn fit_window_uses_smallest_thread_counts() {
        // Scales perfectly up to four threads and collapses afterwards.
        let records = vec![
            record("foo", None, 1, &[8.0]),
            record("foo", None, 2, &[4.0]),
            record("foo", None, 4, &[2.0]),
            record("foo", None, 8, &[8.0]),
            record("foo", None, 16, &[8.0]),
        ];
        let options = AggregationOptions {
            fit_window: FitWindow::First(NonZeroUsize::new(3).unwrap()),
            ..AggregationOptions::default()
        };

        let windowed = AggregateTable::from_records(records.clone(), &options);
        let full = AggregateTable::from_records(records, &AggregationOptions::default());

        let windowed_alpha = windowed.groups()[0].fit().alpha().unwrap();
        let full_alpha = full.groups()[0].fit().alpha().unwrap();
        assert!(windowed_alpha > 1.0 - 1e-6);
        assert!(full_alpha < windowed_alpha);
    }

    #[test]
    fn empty_input_is_empty_table() {
        let table = AggregateTable::from_records(Vec::new(), &AggregationOptions::default());

        assert!(table.is_empty());
        assert!(table.benchmarks().is_empty());
    }
}
