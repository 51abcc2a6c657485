use num_traits::ToPrimitive;

use crate::error::PlotResult;
use crate::style::{LineProps, TraceStyle, palette_color};
use crate::validation::to_f64_vec;

use super::check_same_len;

/// Ordered `(x, y)` pairs drawn as a line, markers or both.
#[derive(Debug, Clone, PartialEq)]
pub struct Scatter {
    x: Vec<f64>,
    y: Vec<f64>,
    line: LineProps,
    label: Option<String>,
}

impl Scatter {
    /// Build a scatter trace.
    ///
    /// `x` and `y` must have the same length. Without an explicit colour the
    /// first palette entry is used; [`Figure::scatter`](crate::Figure::scatter)
    /// supplies the figure's next palette colour instead.
    pub fn new<X, Y, TX, TY>(x: X, y: Y, style: TraceStyle) -> PlotResult<Self>
    where
        X: IntoIterator<Item = TX>,
        Y: IntoIterator<Item = TY>,
        TX: ToPrimitive,
        TY: ToPrimitive,
    {
        let x = to_f64_vec("x", x)?;
        let y = to_f64_vec("y", y)?;
        Self::from_vecs(x, y, style)
    }

    pub(crate) fn from_vecs(x: Vec<f64>, y: Vec<f64>, style: TraceStyle) -> PlotResult<Self> {
        check_same_len("x", x.len(), "y", y.len())?;
        let line = LineProps::resolve(&style, palette_color(0))?;
        Ok(Self {
            x,
            y,
            line,
            label: style.label,
        })
    }

    /// Abscissas.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Ordinates.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Resolved styling.
    pub const fn line(&self) -> &LineProps {
        &self.line
    }

    /// Legend label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True when there are no points.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
