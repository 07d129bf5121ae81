use crate::cli::Args;
use anyhow::Context;
use clap::Parser;
use parsec_logs_analysis::AggregateTable;
use parsec_logs_parser::{LogParser, ParseError, RunRecord};
use parsec_logs_report::{write_reports, SummaryReport};
use std::io::{self, stdin};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let parser = LogParser::new(args.parser_options());
    let records = read_records(&parser, &args)?;
    info!(records = records.len(), "parsed benchmark logs");

    let table = AggregateTable::from_records(records, &args.aggregation_options());
    if table.is_empty() {
        warn!("no benchmark runs were found");
    }
    write_reports(&table, &args.output_dir, &args.report_options())?;

    if !args.quiet {
        SummaryReport::new(&table)
            .write(&mut io::stdout().lock())
            .context("Cannot print the summary")?;
    }
    Ok(())
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.default_log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Parses every input log. Logs that cannot be understood are skipped, I/O failures abort.
fn read_records(parser: &LogParser, args: &Args) -> anyhow::Result<Vec<RunRecord>> {
    if args.files.is_empty() {
        return collect_records([parser.parse_reader(stdin().lock(), "<stdin>")]);
    }
    collect_records(args.files.iter().map(|file| parser.parse_file(file)))
}

fn collect_records(
    results: impl IntoIterator<Item = Result<RunRecord, ParseError>>,
) -> anyhow::Result<Vec<RunRecord>> {
    let mut records = Vec::new();
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(error) if error.is_fatal() => return Err(error.into()),
            Err(error) => warn!("Skipping log: {error}"),
        }
    }
    Ok(records)
}
