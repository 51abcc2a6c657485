//! Gaussian kernel density estimation.

use std::f64::consts::PI;

use num_traits::ToPrimitive;

use crate::error::{PlotError, PlotResult};
use crate::style::{LineProps, TraceStyle};
use crate::validation::to_f64_vec;

use super::Scatter;

/// Kernel bandwidth selection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Bandwidth {
    /// Scott's rule, factor `n^(-1/5)`.
    #[default]
    Scott,
    /// Silverman's rule, factor `(3n/4)^(-1/5)`.
    Silverman,
    /// Explicit kernel standard deviation.
    Sigma(f64),
}

/// Evaluation settings for [`Kde`].
#[derive(Debug, Clone, PartialEq)]
pub struct KdeOptions {
    /// Bandwidth rule.
    pub bandwidth: Bandwidth,
    /// Evaluation points; `None` uses an even grid over the sample range.
    pub x: Option<Vec<f64>>,
    /// Size of the automatic grid.
    pub n_points: usize,
}

impl Default for KdeOptions {
    fn default() -> Self {
        Self {
            bandwidth: Bandwidth::Scott,
            x: None,
            n_points: 99,
        }
    }
}

impl KdeOptions {
    /// Scott bandwidth on a 99-point grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bandwidth rule.
    pub const fn with_bandwidth(mut self, bandwidth: Bandwidth) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Evaluate at these coordinates instead of the automatic grid.
    pub fn with_x(mut self, x: Vec<f64>) -> Self {
        self.x = Some(x);
        self
    }

    /// Set the size of the automatic grid.
    pub const fn with_n_points(mut self, n_points: usize) -> Self {
        self.n_points = n_points;
        self
    }
}

/// A smooth density curve estimated from samples.
///
/// Rendered as a marker-less [`Scatter`] line.
#[derive(Debug, Clone, PartialEq)]
pub struct Kde {
    samples: Vec<f64>,
    sigma: f64,
    curve: Scatter,
}

impl Kde {
    /// Estimate the density of `samples`.
    ///
    /// Non-finite samples are dropped. At least two distinct finite samples
    /// are required unless an explicit sigma is given, in which case one is
    /// enough.
    pub fn new<S, T>(samples: S, options: KdeOptions, style: TraceStyle) -> PlotResult<Self>
    where
        S: IntoIterator<Item = T>,
        T: ToPrimitive,
    {
        let samples: Vec<f64> = to_f64_vec("samples", samples)?
            .into_iter()
            .filter(|v| v.is_finite())
            .collect();
        let sigma = bandwidth_sigma(&samples, options.bandwidth)?;

        let x = match options.x {
            Some(x) => x,
            None => default_grid(&samples, options.n_points)?,
        };
        let y: Vec<f64> = x.iter().map(|&xi| gaussian_kde(&samples, sigma, xi)).collect();

        let style = TraceStyle {
            marker: None,
            ..style
        };
        let curve = Scatter::from_vecs(x, y, style)?;
        Ok(Self {
            samples,
            sigma,
            curve,
        })
    }

    /// Finite samples the estimate was built from.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Kernel standard deviation actually used.
    pub const fn sigma(&self) -> f64 {
        self.sigma
    }

    /// The evaluated density as a line trace.
    pub const fn curve(&self) -> &Scatter {
        &self.curve
    }

    /// Evaluation points.
    pub fn x(&self) -> &[f64] {
        self.curve.x()
    }

    /// Density at each evaluation point.
    pub fn y(&self) -> &[f64] {
        self.curve.y()
    }

    /// Resolved styling.
    pub const fn line(&self) -> &LineProps {
        self.curve.line()
    }

    /// Legend label.
    pub fn label(&self) -> Option<&str> {
        self.curve.label()
    }
}

fn sample_std(samples: &[f64]) -> f64 {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

fn bandwidth_sigma(samples: &[f64], bandwidth: Bandwidth) -> PlotResult<f64> {
    if let Bandwidth::Sigma(sigma) = bandwidth {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(PlotError::invalid_value(
                "bandwidth",
                format!("sigma must be positive and finite, got {sigma}"),
            ));
        }
        if samples.is_empty() {
            return Err(PlotError::invalid_value("samples", "no finite samples"));
        }
        return Ok(sigma);
    }

    if samples.len() < 2 {
        return Err(PlotError::invalid_value(
            "samples",
            format!("at least 2 finite samples are needed, got {}", samples.len()),
        ));
    }
    let std = sample_std(samples);
    if std <= 0.0 {
        return Err(PlotError::invalid_value(
            "samples",
            "samples have zero variance; pass an explicit sigma",
        ));
    }
    let n = samples.len() as f64;
    let factor = match bandwidth {
        Bandwidth::Silverman => (n * 3.0 / 4.0).powf(-0.2),
        _ => n.powf(-0.2),
    };
    Ok(factor * std)
}

fn default_grid(samples: &[f64], n_points: usize) -> PlotResult<Vec<f64>> {
    if n_points < 2 {
        return Err(PlotError::invalid_value(
            "n_points",
            format!("at least 2 grid points are needed, got {n_points}"),
        ));
    }
    let lo = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let step = (hi - lo) / (n_points - 1) as f64;
    Ok((0..n_points).map(|i| lo + step * i as f64).collect())
}

fn gaussian_kde(samples: &[f64], sigma: f64, x: f64) -> f64 {
    let norm = 1.0 / (samples.len() as f64 * sigma * (2.0 * PI).sqrt());
    samples
        .iter()
        .map(|&s| (-0.5 * ((x - s) / sigma).powi(2)).exp())
        .sum::<f64>()
        * norm
}
