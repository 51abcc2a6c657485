//! Histogram binning and staircase reconstruction.
//!
//! Samples are binned into `k` finite bins plus two open-ended tails
//! (`(-inf, e_0)` and `(e_k, +inf)`). The result is kept as a staircase of
//! `2k + 4` points starting at `x = -inf` and ending at `x = +inf` so a line
//! renderer can draw the whole distribution, tails included, as one polyline.
//! [`Histogram::finite_step_x`] replaces the infinite abscissas with
//! coordinates extrapolated from the innermost edges for renderers that cannot
//! plot points at infinity.

use num_traits::ToPrimitive;
use tracing::warn;

use crate::error::{PlotError, PlotResult};
use crate::style::{LineProps, TraceStyle, palette_color};
use crate::validation::to_f64_vec;

/// Upper bound on the number of bins.
///
/// Rule-based binning (`Auto`, `Sturges`, `FreedmanDiaconis`, `Sqrt`) is
/// clamped to it; an explicit [`Bins::Count`] above it is rejected.
pub const MAX_BINS: usize = 10_000;

/// How the bin edges are chosen.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Bins {
    /// The smaller of the Sturges and Freedman-Diaconis widths.
    #[default]
    Auto,
    /// Width `range / (log2(n) + 1)`.
    Sturges,
    /// Width `2 * IQR / n^(1/3)`.
    FreedmanDiaconis,
    /// Width `range / sqrt(n)`.
    Sqrt,
    /// This many equal-width bins spanning the data.
    Count(usize),
    /// Explicit, strictly increasing edges.
    Edges(Vec<f64>),
}

/// Treatment of NaN samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NanPolicy {
    /// Drop NaN samples before binning.
    #[default]
    Omit,
    /// Fail with a value error if any sample is NaN.
    Raise,
}

/// Binning configuration for [`Histogram`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistogramOptions {
    /// Edge selection.
    pub bins: Bins,
    /// Normalise inner bins so their area integrates to one.
    pub density: bool,
    /// What to do with NaN samples.
    pub nan_policy: NanPolicy,
}

impl HistogramOptions {
    /// Default options: automatic bins, raw counts, NaN omitted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bin selection.
    pub fn with_bins(mut self, bins: Bins) -> Self {
        self.bins = bins;
        self
    }

    /// Enable or disable density normalisation.
    pub const fn with_density(mut self, density: bool) -> Self {
        self.density = density;
        self
    }

    /// Set the NaN policy.
    pub const fn with_nan_policy(mut self, nan_policy: NanPolicy) -> Self {
        self.nan_policy = nan_policy;
        self
    }
}

/// A binned distribution with open-ended tails.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    samples: Vec<f64>,
    bin_edges: Vec<f64>,
    counts: Vec<usize>,
    heights: Vec<f64>,
    underflow: usize,
    overflow: usize,
    density: bool,
    x: Vec<f64>,
    y: Vec<f64>,
    line: LineProps,
    label: Option<String>,
}

impl Histogram {
    /// Bin `samples` and build the staircase.
    ///
    /// Bins are half-open `[e_i, e_{i+1})` except the last one, which also
    /// contains its right edge. Samples below the first edge (including
    /// `-inf`) count as underflow, samples above the last edge (including
    /// `+inf`) as overflow.
    pub fn new<S, T>(samples: S, options: HistogramOptions, style: TraceStyle) -> PlotResult<Self>
    where
        S: IntoIterator<Item = T>,
        T: ToPrimitive,
    {
        let raw = to_f64_vec("samples", samples)?;
        let nan_count = raw.iter().filter(|v| v.is_nan()).count();
        if nan_count > 0 && options.nan_policy == NanPolicy::Raise {
            return Err(PlotError::invalid_value(
                "samples",
                format!("{nan_count} NaN samples present and nan_policy is Raise"),
            ));
        }
        let samples: Vec<f64> = raw.into_iter().filter(|v| !v.is_nan()).collect();

        let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        let bin_edges = compute_edges(&finite, &options.bins)?;
        let (counts, underflow, overflow) = count_into_bins(&samples, &bin_edges);
        let heights = bin_heights(&counts, &bin_edges, options.density);

        let (tail_left, tail_right) = if options.density {
            (0.0, 0.0)
        } else {
            (underflow as f64, overflow as f64)
        };
        let (x, y) = step_curve(&bin_edges, &heights, tail_left, tail_right);

        let line = LineProps::resolve(&style, palette_color(0))?;
        Ok(Self {
            samples,
            bin_edges,
            counts,
            heights,
            underflow,
            overflow,
            density: options.density,
            x,
            y,
            line,
            label: style.label,
        })
    }

    /// Non-NaN input samples.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// The `k + 1` finite edges.
    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }

    /// Number of finite bins.
    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    /// Raw per-bin counts of the finite bins.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Plotted heights of the finite bins (counts, or densities).
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Samples strictly below the first edge.
    pub const fn underflow(&self) -> usize {
        self.underflow
    }

    /// Samples strictly above the last edge.
    pub const fn overflow(&self) -> usize {
        self.overflow
    }

    /// Whether heights are densities.
    pub const fn is_density(&self) -> bool {
        self.density
    }

    /// Midpoints of the finite bins.
    pub fn bin_centers(&self) -> Vec<f64> {
        self.bin_edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    /// Plotted height of every bin, tails included: `[left, inner..., right]`.
    pub fn bin_counts(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.heights.len() + 2);
        out.push(self.y[0]);
        out.extend_from_slice(&self.heights);
        out.push(self.y[self.y.len() - 1]);
        out
    }

    /// Interval of every bin, tails included, matching [`Histogram::bin_counts`].
    pub fn bin_ranges(&self) -> Vec<(f64, f64)> {
        let mut out = Vec::with_capacity(self.bin_edges.len() + 1);
        out.push((f64::NEG_INFINITY, self.bin_edges[0]));
        out.extend(self.bin_edges.windows(2).map(|w| (w[0], w[1])));
        out.push((self.bin_edges[self.bin_edges.len() - 1], f64::INFINITY));
        out
    }

    /// Staircase abscissas, starting at `-inf` and ending at `+inf`.
    pub fn step_x(&self) -> &[f64] {
        &self.x
    }

    /// Staircase ordinates.
    pub fn step_y(&self) -> &[f64] {
        &self.y
    }

    /// Staircase abscissas with the infinite endpoints replaced by
    /// `e_0 - (e_1 - e_0)` and `e_k + (e_k - e_{k-1})`.
    pub fn finite_step_x(&self) -> Vec<f64> {
        let mut x = self.x.clone();
        let n = x.len();
        x[0] = x[1] - (x[3] - x[1]);
        x[n - 1] = x[n - 2] + (x[n - 2] - x[n - 4]);
        x
    }

    /// Marker positions: the centre of every bin (tails included, drawn
    /// between the extrapolated endpoint and the outer edge) at its height.
    pub fn marker_positions(&self) -> Vec<(f64, f64)> {
        let x = self.finite_step_x();
        (0..x.len() / 2)
            .map(|i| (x[2 * i] + (x[2 * i + 1] - x[2 * i]) / 2.0, self.y[2 * i]))
            .collect()
    }

    /// Resolved styling.
    pub const fn line(&self) -> &LineProps {
        &self.line
    }

    /// Legend label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

fn linspace(lo: f64, hi: f64, n_bins: usize) -> Vec<f64> {
    let step = (hi - lo) / n_bins as f64;
    let mut edges: Vec<f64> = (0..n_bins).map(|i| lo + step * i as f64).collect();
    edges.push(hi);
    edges
}

/// Linear-interpolation percentile of sorted data.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let pos = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn rule_width(finite: &[f64], bins: &Bins) -> f64 {
    let n = finite.len() as f64;
    let (min, max) = min_max(finite);
    let ptp = max - min;
    let sturges = ptp / (n.log2() + 1.0);
    let fd = || {
        let mut sorted = finite.to_vec();
        sorted.sort_by(f64::total_cmp);
        let iqr = percentile(&sorted, 75.0) - percentile(&sorted, 25.0);
        2.0 * iqr * n.powf(-1.0 / 3.0)
    };
    match bins {
        Bins::Sturges => sturges,
        Bins::Sqrt => ptp / n.sqrt(),
        Bins::FreedmanDiaconis => fd(),
        _ => {
            let fd = fd();
            if fd > 0.0 { fd.min(sturges) } else { sturges }
        }
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn compute_edges(finite: &[f64], bins: &Bins) -> PlotResult<Vec<f64>> {
    if let Bins::Edges(edges) = bins {
        if edges.len() < 2 {
            return Err(PlotError::invalid_value("bins", "at least two edges are required"));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(PlotError::invalid_value("bins", "edges must be finite"));
        }
        if edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PlotError::invalid_value("bins", "edges must be strictly increasing"));
        }
        return Ok(edges.clone());
    }
    match bins {
        Bins::Count(0) => {
            return Err(PlotError::invalid_value("bins", "bin count must be positive"));
        }
        Bins::Count(n) if *n > MAX_BINS => {
            return Err(PlotError::invalid_value(
                "bins",
                format!("bin count {n} exceeds the maximum of {MAX_BINS}"),
            ));
        }
        _ => {}
    }

    let (lo, hi) = if finite.is_empty() {
        (0.0, 1.0)
    } else {
        let (min, max) = min_max(finite);
        if min == max { (min - 0.5, max + 0.5) } else { (min, max) }
    };
    if !(hi - lo).is_finite() {
        return Err(PlotError::invalid_value(
            "samples",
            "the range of the finite samples overflows f64",
        ));
    }

    let n_bins = match bins {
        Bins::Count(n) => *n,
        _ if finite.is_empty() => 1,
        rule => {
            let width = rule_width(finite, rule);
            let wanted = (hi - lo) / width;
            if !wanted.is_finite() || wanted <= 0.0 {
                1
            } else if wanted > MAX_BINS as f64 {
                warn!(wanted, max = MAX_BINS, "bin rule asks for too many bins, clamping");
                MAX_BINS
            } else {
                wanted.ceil().max(1.0) as usize
            }
        }
    };
    Ok(linspace(lo, hi, n_bins))
}

/// Per-bin counts plus (underflow, overflow).
fn count_into_bins(samples: &[f64], edges: &[f64]) -> (Vec<usize>, usize, usize) {
    let first = edges[0];
    let last = edges[edges.len() - 1];
    let mut counts = vec![0usize; edges.len() - 1];
    let mut underflow = 0;
    let mut overflow = 0;
    for &v in samples {
        if v < first {
            underflow += 1;
        } else if v > last {
            overflow += 1;
        } else if v == last {
            counts[edges.len() - 2] += 1;
        } else {
            let idx = edges.partition_point(|&e| e <= v) - 1;
            counts[idx] += 1;
        }
    }
    (counts, underflow, overflow)
}

fn bin_heights(counts: &[usize], edges: &[f64], density: bool) -> Vec<f64> {
    if !density {
        return counts.iter().map(|&c| c as f64).collect();
    }
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts
        .iter()
        .zip(edges.windows(2))
        .map(|(&c, w)| c as f64 / (total as f64 * (w[1] - w[0])))
        .collect()
}

fn step_curve(edges: &[f64], heights: &[f64], left: f64, right: f64) -> (Vec<f64>, Vec<f64>) {
    let n_points = 2 * heights.len() + 4;
    let mut x = Vec::with_capacity(n_points);
    let mut y = Vec::with_capacity(n_points);

    x.push(f64::NEG_INFINITY);
    y.push(left);
    let mut previous = left;
    for (&edge, &h) in edges.iter().zip(heights) {
        x.push(edge);
        y.push(previous);
        x.push(edge);
        y.push(h);
        previous = h;
    }
    let last = edges[edges.len() - 1];
    x.push(last);
    y.push(previous);
    x.push(last);
    y.push(right);
    x.push(f64::INFINITY);
    y.push(right);
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx_eq::assert_approx_eq;

    fn with_edges(samples: &[f64], edges: &[f64]) -> Histogram {
        Histogram::new(
            samples.iter().copied(),
            HistogramOptions::new().with_bins(Bins::Edges(edges.to_vec())),
            TraceStyle::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_explicit_edges() {
        let h = with_edges(&[0.0, 0.0, 1.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(h.counts(), &[2, 3, 1]);
        assert_eq!(h.underflow(), 0);
        assert_eq!(h.overflow(), 0);
        assert_eq!(h.bin_counts(), vec![0.0, 2.0, 3.0, 1.0, 0.0]);
        assert_eq!(h.bin_centers(), vec![0.5, 1.5, 2.5]);
    }

    #[test]
    fn test_step_curve_shape() {
        let h = with_edges(&[0.0, 0.0, 1.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(h.step_x().len(), 2 * h.n_bins() + 4);
        assert_eq!(h.step_y().len(), 2 * h.n_bins() + 4);
        assert_eq!(
            h.step_x()[1..9],
            [0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]
        );
        assert_eq!(h.step_y(), &[0.0, 0.0, 2.0, 2.0, 3.0, 3.0, 1.0, 1.0, 0.0, 0.0]);
        assert!(h.step_x()[0].is_infinite() && h.step_x()[0] < 0.0);
        assert!(h.step_x()[9].is_infinite() && h.step_x()[9] > 0.0);
    }

    #[test]
    fn test_finite_step_x_extrapolates() {
        let h = with_edges(&[1.0, 2.5], &[1.0, 2.0, 4.0]);
        let x = h.finite_step_x();
        assert_eq!(x[0], 0.0);
        assert_approx_eq!(x[x.len() - 1], 6.0);
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_marker_positions_cover_tails() {
        let h = with_edges(&[-5.0, 0.5, 1.5, 1.7, 9.0, 9.0], &[0.0, 1.0, 2.0]);
        let markers = h.marker_positions();
        assert_eq!(markers.len(), h.n_bins() + 2);
        assert_approx_eq!(markers[0].0, -0.5);
        assert_approx_eq!(markers[0].1, 1.0);
        assert_approx_eq!(markers[1].0, 0.5);
        assert_approx_eq!(markers[2].0, 1.5);
        assert_approx_eq!(markers[2].1, 2.0);
        assert_approx_eq!(markers[3].0, 2.5);
        assert_approx_eq!(markers[3].1, 2.0);
    }

    #[test]
    fn test_boundaries() {
        // last bin is closed, the others half-open
        let h = with_edges(&[0.0, 1.0, 2.0, 2.0000001, -0.0000001], &[0.0, 1.0, 2.0]);
        assert_eq!(h.counts(), &[1, 2]);
        assert_eq!(h.underflow(), 1);
        assert_eq!(h.overflow(), 1);
    }

    #[test]
    fn test_counts_are_conserved() {
        let samples = [-3.0, -1.0, 0.2, 0.4, 0.9, 1.1, 5.0, f64::INFINITY, f64::NEG_INFINITY];
        let h = with_edges(&samples, &[0.0, 0.5, 1.0]);
        let total: usize = h.counts().iter().sum::<usize>() + h.underflow() + h.overflow();
        assert_eq!(total, samples.len());
        assert_eq!(h.underflow(), 3);
        assert_eq!(h.overflow(), 3);
    }

    #[test]
    fn test_nan_policy() {
        let samples = [f64::NAN, 1.0, f64::NEG_INFINITY, f64::INFINITY];
        let h = with_edges(&samples, &[0.0, 2.0]);
        assert_eq!(h.samples().len(), 3);
        assert_eq!(h.counts(), &[1]);
        assert_eq!(h.underflow(), 1);
        assert_eq!(h.overflow(), 1);

        let err = Histogram::new(
            samples,
            HistogramOptions::new().with_nan_policy(NanPolicy::Raise),
            TraceStyle::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_bin_count() {
        let h = Histogram::new(
            [0.0, 1.0, 2.0, 3.0],
            HistogramOptions::new().with_bins(Bins::Count(2)),
            TraceStyle::new(),
        )
        .unwrap();
        assert_eq!(h.bin_edges(), &[0.0, 1.5, 3.0]);
        assert_eq!(h.counts(), &[2, 2]);
    }

    #[test]
    fn test_auto_bins() {
        let samples: Vec<f64> = (0..100).map(f64::from).collect();
        let h = Histogram::new(samples, HistogramOptions::new(), TraceStyle::new()).unwrap();
        // sturges width 99 / (log2(100) + 1) beats the FD width here
        assert_eq!(h.n_bins(), 8);
        assert_eq!(h.bin_edges()[0], 0.0);
        assert_approx_eq!(h.bin_edges()[8], 99.0);
        assert_eq!(h.counts().iter().sum::<usize>(), 100);
    }

    #[test]
    fn test_far_outlier_clamps_rule_bins() {
        let mut samples: Vec<f64> = (0..1000).map(|i| f64::from(i) / 1000.0).collect();
        samples.push(1e30);
        let h = Histogram::new(samples, HistogramOptions::new(), TraceStyle::new()).unwrap();
        assert_eq!(h.n_bins(), MAX_BINS);
        assert_eq!(h.bin_edges().len(), MAX_BINS + 1);
        assert_eq!(h.counts().iter().sum::<usize>(), 1001);

        let samples = [0.0, 0.25, 0.5, 0.75, 1.0, 1e9];
        for bins in [Bins::FreedmanDiaconis, Bins::Sqrt, Bins::Sturges] {
            let h = Histogram::new(samples, HistogramOptions::new().with_bins(bins), TraceStyle::new())
                .unwrap();
            assert!(h.n_bins() <= MAX_BINS);
        }
    }

    #[test]
    fn test_bin_count_limit() {
        let err = Histogram::new(
            [0.0, 1.0],
            HistogramOptions::new().with_bins(Bins::Count(MAX_BINS + 1)),
            TraceStyle::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);

        let h = Histogram::new(
            [0.0, 1.0],
            HistogramOptions::new().with_bins(Bins::Count(MAX_BINS)),
            TraceStyle::new(),
        )
        .unwrap();
        assert_eq!(h.n_bins(), MAX_BINS);
    }

    #[test]
    fn test_overflowing_range_is_rejected() {
        let err = Histogram::new([-f64::MAX, f64::MAX], HistogramOptions::new(), TraceStyle::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_step_curve_shape_for_rules() {
        let samples: Vec<f64> = (0..500).map(|i| (f64::from(i) * 0.37).sin() * 3.0).collect();
        for bins in [Bins::Auto, Bins::Sturges, Bins::Sqrt, Bins::FreedmanDiaconis] {
            let h = Histogram::new(
                samples.iter().copied(),
                HistogramOptions::new().with_bins(bins.clone()),
                TraceStyle::new(),
            )
            .unwrap();
            assert!(h.n_bins() >= 1, "{bins:?}");
            assert_eq!(h.step_x().len(), 2 * h.n_bins() + 4, "{bins:?}");
            assert_eq!(h.step_y().len(), 2 * h.n_bins() + 4, "{bins:?}");
            assert_eq!(h.finite_step_x().len(), 2 * h.n_bins() + 4, "{bins:?}");
        }
    }

    #[test]
    fn test_degenerate_range() {
        let h = Histogram::new([5.0, 5.0, 5.0], HistogramOptions::new(), TraceStyle::new())
            .unwrap();
        assert_eq!(h.bin_edges(), &[4.5, 5.5]);
        assert_eq!(h.counts(), &[3]);

        let empty = Histogram::new(Vec::<f64>::new(), HistogramOptions::new(), TraceStyle::new())
            .unwrap();
        assert_eq!(empty.bin_edges(), &[0.0, 1.0]);
        assert_eq!(empty.counts(), &[0]);
    }

    #[test]
    fn test_density() {
        let h = Histogram::new(
            [0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 10.0],
            HistogramOptions::new()
                .with_bins(Bins::Edges(vec![0.0, 1.0, 2.0, 3.0]))
                .with_density(true),
            TraceStyle::new(),
        )
        .unwrap();
        let area: f64 = h
            .heights()
            .iter()
            .zip(h.bin_edges().windows(2))
            .map(|(hgt, w)| hgt * (w[1] - w[0]))
            .sum();
        assert_approx_eq!(area, 1.0);
        assert_eq!(h.overflow(), 1);
        let counts = h.bin_counts();
        assert_eq!(counts[0], 0.0);
        assert_eq!(counts[4], 0.0);
    }

    #[test]
    fn test_invalid_bins() {
        for bins in [
            Bins::Count(0),
            Bins::Edges(vec![1.0]),
            Bins::Edges(vec![0.0, 0.0, 1.0]),
            Bins::Edges(vec![0.0, f64::INFINITY]),
        ] {
            let err = Histogram::new([1.0], HistogramOptions::new().with_bins(bins), TraceStyle::new())
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Value);
        }
    }

    #[test]
    fn test_bin_ranges() {
        let h = with_edges(&[0.5], &[0.0, 1.0]);
        let ranges = h.bin_ranges();
        assert_eq!(ranges.len(), h.bin_counts().len());
        assert_eq!(ranges[1], (0.0, 1.0));
        assert!(ranges[0].0.is_infinite());
        assert!(ranges[2].1.is_infinite());
    }
}
