use crate::BindingMode;

/// One parsed benchmark log.
#[derive(Clone, PartialEq, Debug)]
pub struct RunRecord {
    /// The execution node identifier from the first header line. It is passed through as-is.
    pub node: String,
    /// The name of the benchmark (e.g., `blackscholes`).
    pub benchmark_name: String,
    /// The number of repetitions announced by the harness.
    pub repetitions: u32,
    /// The number of threads the benchmark was configured with.
    pub thread_count: u32,
    /// The number of benchmark instances that were executed at the same time.
    pub parallel_executions: u32,
    /// The input set (e.g., `native`, `simlarge`).
    pub input_size: String,
    /// The thread binding policy.
    pub binding_mode: BindingMode,
    /// The measured durations in seconds, in the order in which they appear in the log.
    pub samples: Vec<f64>,
    /// The number of timing samples that were discarded because the run dumped core.
    pub dropped_samples: u32,
}

impl RunRecord {
    /// Returns the number of samples the harness announced in the header.
    pub fn expected_samples(&self) -> u64 {
        u64::from(self.repetitions) * u64::from(self.parallel_executions)
    }

    /// Returns true if the log contained no usable timing lines.
    pub fn has_samples(&self) -> bool {
        !self.samples.is_empty()
    }
}
