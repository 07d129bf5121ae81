use crate::BenchmarkReport;
use parsec_logs_analysis::amdahl::ideal_speedup;
use parsec_logs_analysis::{AggregateGroup, AggregateRow, AmdahlFit};
use plotters::coord::CoordTranslate;
use plotters::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

const PLOT_SIZE: (u32, u32) = (1024, 768);
const CURVE_POINTS: u32 = 100;

/// The quantity shown on the value axis of a plot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlotKind {
    /// Speedup relative to the group baseline, with fitted and ideal Amdahl curves.
    Speedup,
    /// Speedup per thread, with fitted and ideal efficiency curves.
    Efficiency,
    /// Mean execution time with one standard deviation as error bars.
    Time,
}

impl PlotKind {
    pub const ALL: [PlotKind; 3] = [PlotKind::Speedup, PlotKind::Efficiency, PlotKind::Time];

    /// Returns the file name of this plot for `benchmark`.
    pub fn file_name(self, benchmark: &str) -> String {
        let suffix = match self {
            PlotKind::Speedup => "speedup",
            PlotKind::Efficiency => "eff",
            PlotKind::Time => "time",
        };
        format!("{benchmark}_{suffix}_plot.svg")
    }

    fn label(self) -> &'static str {
        match self {
            PlotKind::Speedup => "Speedup",
            PlotKind::Efficiency => "Efficiency",
            PlotKind::Time => "Time (s)",
        }
    }

    fn value(self, row: &AggregateRow) -> f64 {
        match self {
            PlotKind::Speedup => row.speedup,
            PlotKind::Efficiency => row.efficiency,
            PlotKind::Time => row.mean(),
        }
    }

    /// The standard deviation of [Self::value], propagated from the measured times.
    fn error(self, row: &AggregateRow) -> f64 {
        match self {
            PlotKind::Speedup => row.speedup_stddev(),
            PlotKind::Efficiency => row.efficiency * row.coefficient_of_variation(),
            PlotKind::Time => row.stddev(),
        }
    }

    fn fitted(self, fit: &AmdahlFit, threads: f64) -> Option<f64> {
        match self {
            PlotKind::Speedup => Some(fit.speedup(threads)),
            PlotKind::Efficiency => Some(fit.efficiency(threads)),
            PlotKind::Time => None,
        }
    }

    fn ideal(self, threads: f64) -> Option<f64> {
        match self {
            PlotKind::Speedup => Some(ideal_speedup(threads)),
            PlotKind::Efficiency => Some(1.0),
            PlotKind::Time => None,
        }
    }

    /// Returns true if the value axis uses a logarithmic scale.
    fn log_values(self, groups: &[&AggregateGroup]) -> bool {
        match self {
            PlotKind::Speedup => true,
            PlotKind::Efficiency => groups.iter().any(|group| group.fit().fitted().is_some()),
            PlotKind::Time => false,
        }
    }
}

/// A measured point with its error.
#[derive(Clone, Copy, Debug)]
struct Point {
    threads: f64,
    value: f64,
    error: f64,
}

/// The SVG plots of a single benchmark.
///
/// Thread counts are shown on a log-2 axis. Each binding mode is drawn as its own series.
pub struct BenchmarkPlots<'table> {
    benchmark: &'table str,
    groups: Vec<&'table AggregateGroup>,
}

impl<'table> BenchmarkPlots<'table> {
    pub fn new(benchmark: &'table str, groups: Vec<&'table AggregateGroup>) -> Self {
        Self { benchmark, groups }
    }

    /// Draws a single plot to `path`.
    ///
    /// Returns `false` if there is nothing to draw, in which case no file is created.
    pub fn draw(&self, kind: PlotKind, path: &Path) -> anyhow::Result<bool> {
        let points = self
            .groups
            .iter()
            .map(|group| measured_points(kind, group))
            .collect::<Vec<_>>();
        let Some((x_min, x_max)) = bounds(points.iter().flatten().map(|p| p.threads)) else {
            return Ok(false);
        };
        let x_range = x_min / 1.25..x_max * 1.25;
        let curve = curve_thread_counts(x_range.start, x_range.end);

        let mut values = points
            .iter()
            .flatten()
            .flat_map(|p| [p.value, p.value - p.error, p.value + p.error])
            .collect::<Vec<_>>();
        for group in &self.groups {
            if let Some(fit) = group.fit().fitted() {
                values.extend(curve.iter().filter_map(|x| kind.fitted(fit, *x)));
            }
        }
        values.extend(curve.iter().filter_map(|x| kind.ideal(*x)));

        let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut builder = ChartBuilder::on(&root);
        builder
            .caption(
                format!("{}: {}", self.benchmark, kind.label().to_lowercase()),
                ("sans-serif", 30),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70);

        if kind.log_values(&self.groups) {
            let positive = values.iter().copied().filter(|v| *v > 0.0);
            let (y_min, y_max) = bounds(positive).unwrap_or((1.0, 2.0));
            let y_range = y_min / 1.25..(y_max * 1.25).max(y_min * 2.0);
            let mut chart = builder.build_cartesian_2d(
                x_range.log_scale().base(2.0),
                y_range.log_scale().base(2.0),
            )?;
            chart
                .configure_mesh()
                .x_desc("Threads")
                .y_desc(kind.label())
                .x_label_formatter(&|x| format!("{x:.0}"))
                .y_label_formatter(&|y| format!("{y:.2}"))
                .draw()?;
            self.draw_series(&mut chart, kind, &points, &curve)?;
        } else {
            let (_, y_max) = bounds(values.iter().copied()).unwrap_or((0.0, 1.0));
            let y_range = 0.0..(y_max * 1.1).max(f64::MIN_POSITIVE);
            let mut chart =
                builder.build_cartesian_2d(x_range.log_scale().base(2.0), y_range)?;
            chart
                .configure_mesh()
                .x_desc("Threads")
                .y_desc(kind.label())
                .x_label_formatter(&|x| format!("{x:.0}"))
                .draw()?;
            self.draw_series(&mut chart, kind, &points, &curve)?;
        }

        root.present()?;
        Ok(true)
    }

    fn draw_series<'a, CT>(
        &self,
        chart: &mut ChartContext<'a, SVGBackend<'a>, CT>,
        kind: PlotKind,
        points: &[Vec<Point>],
        curve: &[f64],
    ) -> anyhow::Result<()>
    where
        CT: CoordTranslate<From = (f64, f64)>,
    {
        if let Some(ideal) = curve
            .iter()
            .map(|x| kind.ideal(*x).map(|y| (*x, y)))
            .collect::<Option<Vec<_>>>()
        {
            chart
                .draw_series(LineSeries::new(ideal, BLACK.stroke_width(1)))?
                .label("ideal")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(1)));
        }

        for (index, (group, points)) in self.groups.iter().zip(points).enumerate() {
            let color = Palette99::pick(index).to_rgba();
            let bind = group.binding_mode().to_string();

            chart
                .draw_series(LineSeries::new(
                    points.iter().map(|p| (p.threads, p.value)),
                    color.stroke_width(2),
                ))?
                .label(bind.clone())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart.draw_series(
                points
                    .iter()
                    .map(|p| Circle::new((p.threads, p.value), 4, color.filled())),
            )?;
            chart.draw_series(points.iter().filter(|p| p.error.is_finite()).map(|p| {
                let lower = (p.value - p.error).max(p.value / 1000.0);
                ErrorBar::new_vertical(
                    p.threads,
                    lower,
                    p.value,
                    p.value + p.error,
                    color.stroke_width(1),
                    8,
                )
            }))?;

            if let Some(fit) = group.fit().fitted() {
                let fitted = curve
                    .iter()
                    .filter_map(|x| kind.fitted(fit, *x).map(|y| (*x, y)))
                    .collect::<Vec<_>>();
                if !fitted.is_empty() {
                    let faded = color.mix(0.6);
                    chart
                        .draw_series(LineSeries::new(fitted, faded.stroke_width(1)))?
                        .label(format!("{bind} fit (\u{3b1}={:.2})", fit.alpha))
                        .legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 20, y)], faded.stroke_width(1))
                        });
                }
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }
}

impl BenchmarkReport for BenchmarkPlots<'_> {
    /// Draws all plots. A plot that cannot be rendered is reported and skipped.
    fn write_results(&self, output_dir: &Path) -> anyhow::Result<()> {
        for kind in PlotKind::ALL {
            let path = output_dir.join(kind.file_name(self.benchmark));
            match self.draw(kind, &path) {
                Ok(true) => debug!(path = %path.display(), "wrote plot"),
                Ok(false) => debug!(
                    benchmark = self.benchmark,
                    ?kind,
                    "no defined values, skipping plot"
                ),
                Err(error) => warn!(
                    path = %path.display(),
                    error = %format!("{error:#}"),
                    "cannot render plot"
                ),
            }
        }
        Ok(())
    }
}

/// Returns the points of `group` with a defined value.
fn measured_points(kind: PlotKind, group: &AggregateGroup) -> Vec<Point> {
    group
        .rows()
        .iter()
        .map(|row| Point {
            threads: f64::from(row.thread_count),
            value: kind.value(row),
            error: kind.error(row),
        })
        .filter(|p| p.value.is_finite() && p.value > 0.0)
        .collect()
}

/// Returns the minimum and maximum of the finite `values`.
fn bounds(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((min, max)) => Some((f64::min(min, v), f64::max(max, v))),
        })
}

/// Returns thread counts evenly spaced on a logarithmic scale.
fn curve_thread_counts(from: f64, to: f64) -> Vec<f64> {
    let ratio = to / from;
    (0..CURVE_POINTS)
        .map(|i| from * ratio.powf(f64::from(i) / f64::from(CURVE_POINTS - 1)))
        .collect()
}
