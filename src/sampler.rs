//! Sweeps a parsed expression over evenly spaced coordinates for line and
//! surface plots.
//!
//! A failing point never aborts a sweep: every coordinate gets its own
//! [`EvalResult`], so callers keep index alignment between coordinates and
//! values.

use crate::ast::{evaluate, ASTNode, Environment, EvalResult};
use crate::error::SampleError;
use log::debug;
use rayon::prelude::*;
use std::ops::RangeInclusive;

pub const X_VARIABLE: &str = "x";
pub const Y_VARIABLE: &str = "y";

/// Closed interval `[min, max]` along one axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn validate(&self) -> Result<(), SampleError> {
        if self.min.is_finite() && self.max.is_finite() && self.min < self.max {
            Ok(())
        } else {
            Err(SampleError::InvalidRange {
                min: self.min,
                max: self.max,
            })
        }
    }

    /// `intervals + 1` evenly spaced values, first and last exactly on the
    /// bounds.
    ///
    /// A span wider than `f64::MAX` is interpolated from the bounds directly
    /// so it never overflows to infinity.
    fn points(&self, intervals: usize) -> Vec<f64> {
        let span = self.max - self.min;
        (0..=intervals)
            .map(|i| {
                if i == intervals {
                    return self.max;
                }
                let t = i as f64 / intervals as f64;
                if span.is_finite() {
                    self.min + span * t
                } else {
                    self.min * (1.0 - t) + self.max * t
                }
            })
            .collect()
    }
}

impl From<(f64, f64)> for AxisRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

impl From<RangeInclusive<f64>> for AxisRange {
    fn from(range: RangeInclusive<f64>) -> Self {
        Self {
            min: *range.start(),
            max: *range.end(),
        }
    }
}

/// Result of a one-variable sweep. `values[i]` belongs to `x[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSamples {
    pub variable: String,
    pub x: Vec<f64>,
    pub values: Vec<EvalResult>,
}

impl LineSamples {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &EvalResult)> {
        self.x.iter().copied().zip(self.values.iter())
    }

    /// Number of points whose evaluation returned an error.
    pub fn failures(&self) -> usize {
        self.values.iter().filter(|value| value.is_err()).count()
    }
}

/// Result of a two-variable sweep, row-major: `values[i][j]` belongs to
/// `(x[j], y[i])`.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSamples {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub values: Vec<Vec<EvalResult>>,
}

impl SurfaceSamples {
    /// `(rows, columns)`, i.e. `(y.len(), x.len())`.
    pub fn shape(&self) -> (usize, usize) {
        (self.y.len(), self.x.len())
    }

    pub fn len(&self) -> usize {
        self.x.len() * self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&EvalResult> {
        self.values.get(row)?.get(column)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[EvalResult]> {
        self.values.iter().map(Vec::as_slice)
    }

    pub fn failures(&self) -> usize {
        self.values
            .iter()
            .flatten()
            .filter(|value| value.is_err())
            .count()
    }
}

/// Evaluates `ast` at `point_count + 1` evenly spaced values of `variable`
/// between `x_min` and `x_max` inclusive.
pub fn sample_line(
    ast: &ASTNode,
    variable: &str,
    x_min: f64,
    x_max: f64,
    point_count: usize,
) -> Result<LineSamples, SampleError> {
    let range = AxisRange::new(x_min, x_max);
    range.validate()?;
    if point_count == 0 {
        return Err(SampleError::InvalidResolution);
    }

    let x = range.points(point_count);
    let mut environment = Environment::new().with(variable, x_min);
    let values: Vec<EvalResult> = x
        .iter()
        .map(|&value| {
            environment.bind(variable, value);
            evaluate(ast, &environment)
        })
        .collect();

    let samples = LineSamples {
        variable: variable.to_string(),
        x,
        values,
    };
    debug!(
        "Sampled {} over [{}, {}]: {} points, {} failed",
        variable,
        x_min,
        x_max,
        samples.len(),
        samples.failures()
    );
    Ok(samples)
}

/// Evaluates `ast` on a `(resolution + 1) x (resolution + 1)` grid binding
/// both `x` and `y`.
///
/// Rows are evaluated in parallel; each row owns its environment, and the
/// returned grid is ordered by coordinate index.
pub fn sample_surface(
    ast: &ASTNode,
    x_range: impl Into<AxisRange>,
    y_range: impl Into<AxisRange>,
    resolution: usize,
) -> Result<SurfaceSamples, SampleError> {
    let x_range = x_range.into();
    let y_range = y_range.into();
    x_range.validate()?;
    y_range.validate()?;
    if resolution == 0 {
        return Err(SampleError::InvalidResolution);
    }

    let x = x_range.points(resolution);
    let y = y_range.points(resolution);
    let values: Vec<Vec<EvalResult>> = y
        .par_iter()
        .map(|&y_value| {
            let mut environment = Environment::new()
                .with(X_VARIABLE, x_range.min)
                .with(Y_VARIABLE, y_value);
            x.iter()
                .map(|&x_value| {
                    environment.bind(X_VARIABLE, x_value);
                    evaluate(ast, &environment)
                })
                .collect()
        })
        .collect();

    let samples = SurfaceSamples { x, y, values };
    debug!(
        "Sampled surface {:?}: {} cells, {} failed",
        samples.shape(),
        samples.len(),
        samples.failures()
    );
    Ok(samples)
}
