use clap::{ArgAction, Parser, ValueHint};
use parsec_logs_analysis::{AggregationOptions, FitWindow, DEFAULT_BASELINE_SCALING};
use parsec_logs_parser::ParserOptions;
use parsec_logs_report::ReportOptions;
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about, version, name = "parsec-logs")]
/// Aggregates PARSEC benchmark logs into speedup and efficiency reports
pub struct Args {
    /// Log files to parse
    ///
    /// If no file is given, a single log is read from stdin.
    #[arg(value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,
    /// Directory the reports are written to
    #[arg(short, long, default_value = "results", value_hint = ValueHint::DirPath)]
    pub output_dir: PathBuf,
    /// Scaling of the thread count used for the baseline of each group
    ///
    /// The baseline time of a group is its first mean time multiplied by
    /// max(threads * scaling, 1).
    #[arg(long, default_value_t = DEFAULT_BASELINE_SCALING, value_parser = parse_scaling)]
    pub baseline_scaling: f64,
    /// Fit Amdahl's Law only to the first N points of each group
    #[arg(long, value_name = "N")]
    pub fit_points: Option<NonZeroUsize>,
    /// Keep timing samples that follow a core-dump notice
    #[arg(long)]
    pub keep_core_dump_samples: bool,
    /// Do not render SVG plots
    #[arg(long)]
    pub no_plots: bool,
    /// Omit the raw per-run LaTeX tables
    #[arg(long)]
    pub no_raw_times: bool,
    /// Do not print the summary table
    #[arg(short, long)]
    pub quiet: bool,
    /// Raise the log verbosity, can be repeated
    ///
    /// RUST_LOG takes precedence if it is set.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            discard_after_core_dump: !self.keep_core_dump_samples,
        }
    }

    pub fn aggregation_options(&self) -> AggregationOptions {
        AggregationOptions {
            baseline_scaling: self.baseline_scaling,
            fit_window: self.fit_points.map_or(FitWindow::All, FitWindow::First),
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            plots: !self.no_plots,
            raw_times: !self.no_raw_times,
        }
    }

    /// The log level used if RUST_LOG is not set.
    pub fn default_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn parse_scaling(value: &str) -> Result<f64, String> {
    let scaling = value
        .parse::<f64>()
        .map_err(|error| format!("{value:?} is not a number: {error}"))?;
    if !scaling.is_finite() || scaling < 0.0 {
        return Err(format!("{value} must be a finite, non-negative number"));
    }
    Ok(scaling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["parsec-logs", "a.log", "b.log"]).unwrap();

        assert_eq!(args.files.len(), 2);
        assert_eq!(args.output_dir, PathBuf::from("results"));
        assert_eq!(args.aggregation_options(), AggregationOptions::default());
        assert!(args.parser_options().discard_after_core_dump);
        assert_eq!(args.report_options(), ReportOptions::default());
        assert_eq!(args.default_log_level(), "warn");
    }

    #[test]
    fn options_are_threaded() {
        let args = Args::try_parse_from([
            "parsec-logs",
            "--baseline-scaling",
            "1",
            "--fit-points",
            "3",
            "--keep-core-dump-samples",
            "--no-plots",
            "-vv",
        ])
        .unwrap();

        assert!(args.files.is_empty());
        assert_eq!(args.aggregation_options().baseline_scaling, 1.0);
        assert_eq!(
            args.aggregation_options().fit_window,
            FitWindow::First(NonZeroUsize::new(3).unwrap())
        );
        assert!(!args.parser_options().discard_after_core_dump);
        assert!(!args.report_options().plots);
        assert!(args.report_options().raw_times);
        assert_eq!(args.default_log_level(), "debug");
    }

    #[test]
    fn invalid_values_are_rejected() {
        for invalid in [
            ["--baseline-scaling", "-0.5"],
            ["--baseline-scaling", "inf"],
            ["--baseline-scaling", "fast"],
            ["--fit-points", "0"],
        ] {
            let result = Args::try_parse_from(std::iter::once("parsec-logs").chain(invalid));
            assert!(result.is_err(), "{invalid:?} was accepted");
        }
    }
}
