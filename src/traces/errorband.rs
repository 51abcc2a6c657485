use num_traits::ToPrimitive;

use crate::error::PlotResult;
use crate::style::{LineProps, TraceStyle, palette_color};
use crate::validation::to_f64_vec;

use super::check_same_len;

/// A central line `y(x)` with an asymmetric shaded band
/// `[y - lower, y + higher]` around it.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBand {
    x: Vec<f64>,
    y: Vec<f64>,
    lower: Vec<f64>,
    higher: Vec<f64>,
    line: LineProps,
    label: Option<String>,
}

impl ErrorBand {
    /// Build an error band. All four sequences must have the same length;
    /// `lower` and `higher` are offsets below and above `y`.
    pub fn new<X, Y, L, H, TX, TY, TL, TH>(
        x: X,
        y: Y,
        lower: L,
        higher: H,
        style: TraceStyle,
    ) -> PlotResult<Self>
    where
        X: IntoIterator<Item = TX>,
        Y: IntoIterator<Item = TY>,
        L: IntoIterator<Item = TL>,
        H: IntoIterator<Item = TH>,
        TX: ToPrimitive,
        TY: ToPrimitive,
        TL: ToPrimitive,
        TH: ToPrimitive,
    {
        let x = to_f64_vec("x", x)?;
        let y = to_f64_vec("y", y)?;
        let lower = to_f64_vec("lower", lower)?;
        let higher = to_f64_vec("higher", higher)?;
        check_same_len("x", x.len(), "y", y.len())?;
        check_same_len("x", x.len(), "lower", lower.len())?;
        check_same_len("x", x.len(), "higher", higher.len())?;

        let line = LineProps::resolve(&style, palette_color(0))?;
        Ok(Self {
            x,
            y,
            lower,
            higher,
            line,
            label: style.label,
        })
    }

    /// Abscissas.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Central values.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Offsets below the central line.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Offsets above the central line.
    pub fn higher(&self) -> &[f64] {
        &self.higher
    }

    /// Styling of the central line; the band uses the same colour at half the opacity.
    pub const fn line(&self) -> &LineProps {
        &self.line
    }

    /// Legend label shared by line and band.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// `y + higher`
    pub fn upper_bound(&self) -> Vec<f64> {
        self.y.iter().zip(&self.higher).map(|(y, h)| y + h).collect()
    }

    /// `y - lower`
    pub fn lower_bound(&self) -> Vec<f64> {
        self.y.iter().zip(&self.lower).map(|(y, l)| y - l).collect()
    }

    /// Closed outline of the band: the upper bound left to right followed by
    /// the lower bound right to left.
    pub fn band_polygon(&self) -> Vec<(f64, f64)> {
        let upper = self.upper_bound();
        let lower = self.lower_bound();
        self.x
            .iter()
            .copied()
            .zip(upper)
            .chain(self.x.iter().copied().zip(lower).rev())
            .collect()
    }

    /// Opacity of the shaded band.
    pub fn band_alpha(&self) -> f64 {
        self.line.alpha / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx_eq::assert_approx_eq;

    fn band() -> ErrorBand {
        ErrorBand::new(
            [0.0, 1.0, 2.0],
            [1.0, 2.0, 3.0],
            [0.5, 0.5, 1.0],
            [1.0, 0.25, 0.0],
            TraceStyle::new().with_alpha(0.8),
        )
        .unwrap()
    }

    #[test]
    fn test_bounds() {
        let b = band();
        assert_eq!(b.upper_bound(), vec![2.0, 2.25, 3.0]);
        assert_eq!(b.lower_bound(), vec![0.5, 1.5, 2.0]);
        assert_approx_eq!(b.band_alpha(), 0.4);
    }

    #[test]
    fn test_polygon_goes_out_and_back() {
        let poly = band().band_polygon();
        assert_eq!(
            poly,
            vec![
                (0.0, 2.0),
                (1.0, 2.25),
                (2.0, 3.0),
                (2.0, 2.0),
                (1.0, 1.5),
                (0.0, 0.5)
            ]
        );
    }

    #[test]
    fn test_length_mismatch() {
        let err = ErrorBand::new([0.0, 1.0], [0.0, 1.0], [0.1], [0.1, 0.1], TraceStyle::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }
}
