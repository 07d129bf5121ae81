use crate::grammar::{classify_line, parse_header, LogLine};
use crate::ParseError;
use parsec_logs_model::{BindingMode, RunRecord};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Provides options for parsing benchmark logs.
#[derive(Clone, Copy, Debug)]
pub struct ParserOptions {
    /// Indicates whether a core-dump notice invalidates the next timing sample.
    ///
    /// The harness prints the timing of a crashed run nonetheless. If enabled, that sample is
    /// dropped and counted in [RunRecord::dropped_samples].
    pub discard_after_core_dump: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            discard_after_core_dump: true,
        }
    }
}

/// Parses benchmark logs into [RunRecord]s.
#[derive(Clone, Debug, Default)]
pub struct LogParser {
    options: ParserOptions,
}

impl LogParser {
    /// Creates a new [LogParser].
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Opens and parses the log at `path`. The file is closed before this method returns.
    pub fn parse_file(&self, path: &Path) -> Result<RunRecord, ParseError> {
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|error| ParseError::Io {
            origin: origin.clone(),
            error,
        })?;
        self.parse_reader(BufReader::new(file), &origin)
    }

    /// Parses a log from `reader`. `origin` names the log in diagnostics.
    ///
    /// Invalid UTF-8 sequences are replaced instead of failing the whole log, as crashing
    /// benchmarks occasionally write binary garbage.
    pub fn parse_reader<R: BufRead>(
        &self,
        reader: R,
        origin: &str,
    ) -> Result<RunRecord, ParseError> {
        let mut lines = reader.split(b'\n').map(|line| {
            line.map(|bytes| String::from_utf8_lossy(&bytes).trim_end().to_owned())
                .map_err(|error| ParseError::Io {
                    origin: origin.to_owned(),
                    error,
                })
        });

        let missing_header = || ParseError::MissingHeader {
            origin: origin.to_owned(),
        };
        let node = lines.next().ok_or_else(missing_header)??;
        let header_line = lines.next().ok_or_else(missing_header)??;
        let header = parse_header(&header_line)
            .map_err(|error| ParseError::from_header(origin, &header_line, error))?;

        let mut samples = Vec::new();
        let mut dropped_samples = 0;
        let mut corrupted = false;
        // The node and header lines are the first two lines.
        for (line_number, line) in (3..).zip(lines) {
            let line = line?;
            match classify_line(&line) {
                LogLine::ComputeTime(seconds) | LogLine::Real(seconds) => {
                    if corrupted {
                        corrupted = false;
                        dropped_samples += 1;
                        debug!(file = origin, line = line_number, seconds, "dropping sample of crashed run");
                    } else {
                        samples.push(seconds);
                    }
                }
                LogLine::CoreDump => {
                    warn!(file = origin, line = line_number, "benchmark dumped core");
                    corrupted |= self.options.discard_after_core_dump;
                }
                LogLine::Cancelled => {
                    warn!(file = origin, line = line_number, "benchmark run was cancelled");
                }
                LogLine::Other => {}
            }
        }

        let record = RunRecord {
            node: node.trim().to_owned(),
            benchmark_name: header.benchmark.to_owned(),
            repetitions: header.repetitions,
            thread_count: header.thread_count,
            parallel_executions: header.parallel_executions,
            input_size: header.input_size.to_owned(),
            binding_mode: BindingMode::from_capture(header.binding),
            samples,
            dropped_samples,
        };

        if u64::try_from(record.samples.len()).ok() != Some(record.expected_samples()) {
            debug!(
                file = origin,
                found = record.samples.len(),
                expected = record.expected_samples(),
                "number of samples differs from the announced repetitions"
            );
        }

        Ok(record)
    }
}
