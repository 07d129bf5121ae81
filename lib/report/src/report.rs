use std::path::Path;

/// Represents a report that is written to disk.
pub trait BenchmarkReport {
    /// Writes the files of this report to the given directory.
    fn write_results(&self, output_dir: &Path) -> anyhow::Result<()>;
}
