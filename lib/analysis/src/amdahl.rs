//! Fitting of Amdahl's Law, `S(p) = 1 / ((1 - a) + a / p)`, to observed speedups.
//!
//! The model has a single parameter, the parallel fraction `a`, which is constrained to `[0, 1]`.
//! The fit minimizes the sum of squared residuals with a coarse scan over the interval, followed
//! by a golden-section refinement around the best scan point.

use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;

const SCAN_STEPS: u32 = 200;
const MAX_REFINEMENTS: usize = 100;
const TOLERANCE: f64 = 1e-12;

/// Returns the speedup predicted by Amdahl's Law for the parallel fraction `alpha` on `threads`
/// processors.
pub fn amdahl_speedup(alpha: f64, threads: f64) -> f64 {
    1.0 / ((1.0 - alpha) + alpha / threads)
}

/// Returns the ideal speedup, i.e., a perfectly parallel workload.
pub fn ideal_speedup(threads: f64) -> f64 {
    amdahl_speedup(1.0, threads)
}

/// Selects which points of a group take part in the fit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FitWindow {
    /// Use all points.
    #[default]
    All,
    /// Use only the given number of points with the smallest thread counts.
    First(NonZeroUsize),
}

impl FitWindow {
    /// Restricts `points` (ordered by ascending thread count) to this window.
    pub fn apply<T>(self, points: &[T]) -> &[T] {
        match self {
            FitWindow::All => points,
            FitWindow::First(n) => &points[..n.get().min(points.len())],
        }
    }
}

impl Display for FitWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FitWindow::All => f.write_str("all points"),
            FitWindow::First(n) => write!(f, "first {n} points"),
        }
    }
}

/// A successful fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmdahlFit {
    /// The fitted parallel fraction in `[0, 1]`.
    pub alpha: f64,
    /// The sum of squared residuals at `alpha`.
    pub residual: f64,
}

impl AmdahlFit {
    /// Returns the fitted speedup for `threads`.
    pub fn speedup(&self, threads: f64) -> f64 {
        amdahl_speedup(self.alpha, threads)
    }

    /// Returns the fitted efficiency for `threads`.
    pub fn efficiency(&self, threads: f64) -> f64 {
        self.speedup(threads) / threads
    }
}

/// Reasons for skipping a fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitFailure {
    /// There were no points with a defined speedup.
    NoDefinedPoints,
    /// All points share the same thread count, so the parameter is not identifiable.
    SingleThreadCount,
    /// The residuals were not finite anywhere in the parameter range.
    NoConvergence,
}

impl Display for FitFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FitFailure::NoDefinedPoints => f.write_str("no points with a defined speedup"),
            FitFailure::SingleThreadCount => f.write_str("all points share one thread count"),
            FitFailure::NoConvergence => f.write_str("residuals are not finite"),
        }
    }
}

/// The outcome of fitting a group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FitOutcome {
    Fitted(AmdahlFit),
    Skipped(FitFailure),
}

impl FitOutcome {
    /// Returns the fit, if there is one.
    pub fn fitted(&self) -> Option<&AmdahlFit> {
        match self {
            FitOutcome::Fitted(fit) => Some(fit),
            FitOutcome::Skipped(_) => None,
        }
    }

    /// Returns the fitted parallel fraction, if there is one.
    pub fn alpha(&self) -> Option<f64> {
        self.fitted().map(|fit| fit.alpha)
    }
}

/// Fits Amdahl's Law to `(threads, speedup)` pairs.
///
/// Points with a non-finite or non-positive thread count or speedup are ignored.
pub fn fit_amdahl(points: &[(f64, f64)]) -> FitOutcome {
    let points = points
        .iter()
        .copied()
        .filter(|(threads, speedup)| {
            threads.is_finite() && *threads > 0.0 && speedup.is_finite() && *speedup > 0.0
        })
        .collect::<Vec<_>>();

    if points.is_empty() {
        return FitOutcome::Skipped(FitFailure::NoDefinedPoints);
    }
    if points.iter().map(|(threads, _)| threads.to_bits()).all_equal() {
        return FitOutcome::Skipped(FitFailure::SingleThreadCount);
    }

    let residual = |alpha: f64| {
        points
            .iter()
            .map(|(threads, speedup)| (speedup - amdahl_speedup(alpha, *threads)).powi(2))
            .sum::<f64>()
    };

    let best_step = (0..=SCAN_STEPS)
        .map(|step| {
            let alpha = f64::from(step) / f64::from(SCAN_STEPS);
            (step, residual(alpha))
        })
        .filter(|(_, r)| r.is_finite())
        .min_by(|(_, a), (_, b)| a.total_cmp(b));
    let Some((best_step, best_residual)) = best_step else {
        return FitOutcome::Skipped(FitFailure::NoConvergence);
    };

    let lower = f64::from(best_step.saturating_sub(1)) / f64::from(SCAN_STEPS);
    let upper = f64::from((best_step + 1).min(SCAN_STEPS)) / f64::from(SCAN_STEPS);
    let refined = golden_section(residual, lower, upper);
    let refined_residual = residual(refined);

    let fit = if refined_residual.is_finite() && refined_residual <= best_residual {
        AmdahlFit {
            alpha: refined,
            residual: refined_residual,
        }
    } else {
        AmdahlFit {
            alpha: f64::from(best_step) / f64::from(SCAN_STEPS),
            residual: best_residual,
        }
    };
    FitOutcome::Fitted(AmdahlFit {
        alpha: fit.alpha.clamp(0.0, 1.0),
        ..fit
    })
}

/// Minimizes `f` on `[lower, upper]`, assuming it is unimodal on that interval.
fn golden_section(f: impl Fn(f64) -> f64, mut lower: f64, mut upper: f64) -> f64 {
    let ratio = (5.0_f64.sqrt() - 1.0) / 2.0;
    let mut left = upper - ratio * (upper - lower);
    let mut right = lower + ratio * (upper - lower);
    let mut f_left = f(left);
    let mut f_right = f(right);

    for _ in 0..MAX_REFINEMENTS {
        if upper - lower < TOLERANCE {
            break;
        }
        if f_left < f_right {
            upper = right;
            right = left;
            f_right = f_left;
            left = upper - ratio * (upper - lower);
            f_left = f(left);
        } else {
            lower = left;
            left = right;
            f_left = f_right;
            right = lower + ratio * (upper - lower);
            f_right = f(right);
        }
    }

    (lower + upper) / 2.0
}
