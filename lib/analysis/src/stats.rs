use std::fmt::{Display, Formatter};

/// Holds the statistics computed over the samples of a single row.
///
/// Statistics that are not defined for the number of samples are NaN. An empty sample list has an
/// undefined mean and a single sample has an undefined standard deviation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleStatistics {
    /// Represents how many samples contributed.
    pub number_of_samples: usize,
    /// The arithmetic mean of the samples.
    pub mean: f64,
    /// The sample standard deviation (`n - 1` denominator).
    pub stddev: f64,
}

impl SampleStatistics {
    /// Computes the statistics of `samples`.
    pub fn from_samples(samples: &[f64]) -> Self {
        let number_of_samples = samples.len();
        if number_of_samples == 0 {
            return Self {
                number_of_samples,
                mean: f64::NAN,
                stddev: f64::NAN,
            };
        }

        let n = number_of_samples as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let stddev = if number_of_samples < 2 {
            f64::NAN
        } else {
            let squared_deviations = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>();
            (squared_deviations / (n - 1.0)).sqrt()
        };

        Self {
            number_of_samples,
            mean,
            stddev,
        }
    }

    /// Returns `stddev / mean`.
    pub fn coefficient_of_variation(&self) -> f64 {
        self.stddev / self.mean
    }
}

impl Display for SampleStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} mean={:.3}s stddev={:.3}s",
            self.number_of_samples, self.mean, self.stddev
        )
    }
}
