//! Mapping of z-values onto a `[0, 1]` colour-scale position.
//!
//! Both backends colour heatmaps and contours through [`ColorNorm`] so a grid
//! gets the same colour bounds whichever library draws it.

use ndarray::Array2;
use tracing::warn;

use crate::style::Scale;

/// Map a raw value into colour-scale space: identity for a linear scale,
/// `log10` for a logarithmic one (non-positive values become NaN).
pub fn to_scale_space(value: f64, scale: Scale) -> f64 {
    match scale {
        Scale::Linear => value,
        Scale::Log if value > 0.0 => value.log10(),
        Scale::Log => f64::NAN,
    }
}

/// A z-grid transformed into colour-scale space together with its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorNorm {
    values: Array2<f64>,
    zmin: f64,
    zmax: f64,
    scale: Scale,
    masked: usize,
}

impl ColorNorm {
    /// Transform `z` and resolve the colour bounds.
    ///
    /// `zlim` is given in raw units and overrides the data range. Under a
    /// logarithmic scale every non-positive value is replaced by NaN and a
    /// single warning reports how many were hidden.
    pub fn new(z: &Array2<f64>, scale: Scale, zlim: Option<(f64, f64)>) -> Self {
        let mut masked = 0usize;
        let values = z.mapv(|v| {
            let t = to_scale_space(v, scale);
            if t.is_nan() && !v.is_nan() {
                masked += 1;
            }
            t
        });
        if masked > 0 {
            warn!(
                masked,
                "non-positive values cannot be shown on a logarithmic colour scale and were left blank"
            );
        }

        let (zmin, zmax) = match zlim {
            Some((lo, hi)) => (to_scale_space(lo, scale), to_scale_space(hi, scale)),
            None => finite_range(&values).unwrap_or((0.0, 1.0)),
        };
        Self {
            values,
            zmin,
            zmax,
            scale,
            masked,
        }
    }

    /// Grid in colour-scale space (NaN where nothing is drawn).
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Lower colour bound in colour-scale space.
    pub const fn zmin(&self) -> f64 {
        self.zmin
    }

    /// Upper colour bound in colour-scale space.
    pub const fn zmax(&self) -> f64 {
        self.zmax
    }

    /// The scale the values were transformed with.
    pub const fn scale(&self) -> Scale {
        self.scale
    }

    /// How many cells were hidden by the logarithmic transform.
    pub const fn masked(&self) -> usize {
        self.masked
    }

    /// Position of a colour-scale value within the bounds, clamped to `[0, 1]`.
    ///
    /// `None` for NaN, which is left undrawn.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let span = self.zmax - self.zmin;
        if span <= 0.0 {
            return Some(0.5);
        }
        Some(((value - self.zmin) / span).clamp(0.0, 1.0))
    }
}

fn finite_range(values: &Array2<f64>) -> Option<(f64, f64)> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;
    use ndarray::array;

    #[test]
    fn test_linear_bounds_from_data() {
        let z = array![[1.0, 2.0], [3.0, f64::NAN]];
        let norm = ColorNorm::new(&z, Scale::Linear, None);
        assert_eq!((norm.zmin(), norm.zmax()), (1.0, 3.0));
        assert_eq!(norm.normalize(1.0), Some(0.0));
        assert_eq!(norm.normalize(2.0), Some(0.5));
        assert_eq!(norm.normalize(f64::NAN), None);
        assert_eq!(norm.masked(), 0);
    }

    #[test]
    fn test_log_masks_non_positive() {
        let z = array![[0.0, 10.0], [-1.0, 1000.0]];
        let norm = ColorNorm::new(&z, Scale::Log, None);
        assert_eq!(norm.masked(), 2);
        assert!(norm.values()[[0, 0]].is_nan());
        assert!(norm.values()[[1, 0]].is_nan());
        assert_approx_eq!(norm.values()[[0, 1]], 1.0);
        assert_approx_eq!(norm.zmin(), 1.0);
        assert_approx_eq!(norm.zmax(), 3.0);
    }

    #[test]
    fn test_zlim_overrides_and_clamps() {
        let z = array![[1.0, 5.0]];
        let norm = ColorNorm::new(&z, Scale::Linear, Some((2.0, 4.0)));
        assert_eq!(norm.normalize(1.0), Some(0.0));
        assert_eq!(norm.normalize(5.0), Some(1.0));
        assert_eq!(norm.normalize(3.0), Some(0.5));

        let log = ColorNorm::new(&z, Scale::Log, Some((1.0, 100.0)));
        assert_eq!(log.zmin(), 0.0);
        assert_approx_eq!(log.zmax(), 2.0);
    }

    #[test]
    fn test_constant_grid() {
        let z = array![[2.0, 2.0]];
        let norm = ColorNorm::new(&z, Scale::Linear, None);
        assert_eq!(norm.normalize(2.0), Some(0.5));

        let blank = ColorNorm::new(&array![[f64::NAN]], Scale::Linear, None);
        assert_eq!((blank.zmin(), blank.zmax()), (0.0, 1.0));
    }
}
