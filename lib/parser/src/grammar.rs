//! The line grammar of benchmark logs.
//!
//! A log consists of a node line, a header line and an arbitrary number of body lines. Body lines
//! are classified by [classify_line]; only timing lines and abnormal-termination notices are of
//! interest, everything else is noise from the benchmark binary.
//!
//! | Line                  | Pattern                                                        |
//! |-----------------------|----------------------------------------------------------------|
//! | header                | [HEADER_PATTERN]                                               |
//! | compute time          | contains `COMPUTETIME`, then non-digits and microseconds       |
//! | wall-clock time       | starts with `real`, then a `<minutes>m<seconds>.<fraction>s`   |
//! | cancellation notice   | contains `CANCELLED` or `DUE TO TIME LIMIT`                    |
//! | core-dump notice      | contains `core dumped`                                         |

use regex::Regex;
use std::sync::LazyLock;

/// The grammar of the second header line.
pub const HEADER_PATTERN: &str = r"^Testing (\w+) (\d+) times on (\d+) cores with (\d+) parallel executions using input size:(\w+)( and OMP_PROC_BIND: (\w+))?$";

const COMPUTE_TIME_MARKER: &str = "COMPUTETIME";
const MICROS_PER_SECOND: f64 = 1_000_000.0;

#[allow(clippy::expect_used, reason = "Indicates programming error")]
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HEADER_PATTERN).expect("header pattern is valid"));

#[allow(clippy::expect_used, reason = "Indicates programming error")]
static COMPUTE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"COMPUTETIME[^\d]+(\d+)").expect("compute time pattern is valid"));

#[allow(clippy::expect_used, reason = "Indicates programming error")]
static REAL_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*real\s+(\d+m\d+\.\d+s)").expect("real time pattern is valid")
});

#[allow(clippy::expect_used, reason = "Indicates programming error")]
static MINUTES_AND_SECONDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)m(\d+\.\d+)s").expect("duration pattern is valid")
});

/// The fields announced by the header line of a log.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Header<'line> {
    pub benchmark: &'line str,
    pub repetitions: u32,
    pub thread_count: u32,
    pub parallel_executions: u32,
    pub input_size: &'line str,
    /// The `OMP_PROC_BIND` policy, if the clause is present.
    pub binding: Option<&'line str>,
}

/// Reasons for rejecting a header line.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum HeaderError {
    #[error("the line does not follow the header grammar")]
    NoMatch,
    #[error("invalid {field} count: {value}")]
    InvalidCount { field: &'static str, value: String },
}

/// Matches `line` against [HEADER_PATTERN].
///
/// Trailing whitespace (including a `\r` from CRLF logs) is ignored. Thread counts and parallel
/// executions must be at least one.
pub fn parse_header(line: &str) -> Result<Header<'_>, HeaderError> {
    let captures = HEADER.captures(line.trim_end()).ok_or(HeaderError::NoMatch)?;
    let text = |index: usize| captures.get(index).map_or("", |m| m.as_str());

    Ok(Header {
        benchmark: text(1),
        repetitions: parse_count("repetition", text(2), 0)?,
        thread_count: parse_count("thread", text(3), 1)?,
        parallel_executions: parse_count("parallel execution", text(4), 1)?,
        input_size: text(5),
        binding: captures.get(7).map(|m| m.as_str()),
    })
}

fn parse_count(field: &'static str, value: &str, min: u32) -> Result<u32, HeaderError> {
    value
        .parse::<u32>()
        .ok()
        .filter(|count| *count >= min)
        .ok_or_else(|| HeaderError::InvalidCount {
            field,
            value: value.to_owned(),
        })
}

/// The classification of a single body line.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LogLine {
    /// A `COMPUTETIME` marker, converted to seconds.
    ComputeTime(f64),
    /// The `real` line of the `time` builtin, converted to seconds.
    Real(f64),
    /// The scheduler cancelled the job.
    Cancelled,
    /// The benchmark dumped core.
    CoreDump,
    /// Anything else.
    Other,
}

impl LogLine {
    /// Returns the measured duration if this is a timing line.
    pub fn seconds(self) -> Option<f64> {
        match self {
            LogLine::ComputeTime(seconds) | LogLine::Real(seconds) => Some(seconds),
            LogLine::Cancelled | LogLine::CoreDump | LogLine::Other => None,
        }
    }
}

/// Classifies a body line of a log.
///
/// A line that carries the `COMPUTETIME` token is never considered as a `real` line, even if the
/// token is not followed by a number.
pub fn classify_line(line: &str) -> LogLine {
    if line.contains(COMPUTE_TIME_MARKER) {
        return COMPUTE_TIME
            .captures(line)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map_or(LogLine::Other, |micros| {
                LogLine::ComputeTime(micros / MICROS_PER_SECOND)
            });
    }

    if let Some(duration) = REAL_TIME.captures(line).and_then(|c| c.get(1)) {
        return LogLine::Real(parse_minutes_and_seconds(duration.as_str()));
    }

    if line.contains("core dumped") {
        LogLine::CoreDump
    } else if line.contains("CANCELLED") || line.contains("DUE TO TIME LIMIT") {
        LogLine::Cancelled
    } else {
        LogLine::Other
    }
}

/// Converts a `<minutes>m<seconds>.<fraction>s` duration into seconds.
///
/// Strings that do not start with this pattern yield `0.0`.
pub fn parse_minutes_and_seconds(duration: &str) -> f64 {
    let Some(captures) = MINUTES_AND_SECONDS.captures(duration) else {
        return 0.0;
    };
    let minutes = captures
        .get(1)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);
    let seconds = captures
        .get(2)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);
    minutes * 60.0 + seconds
}
