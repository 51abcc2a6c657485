//! Data extents used to size raster charts.

/// Axis-aligned bounds of plotted data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotBounds {
    /// Smallest x.
    pub x_min: f64,
    /// Largest x.
    pub x_max: f64,
    /// Smallest y.
    pub y_min: f64,
    /// Largest y.
    pub y_max: f64,
}

impl PlotBounds {
    /// Bounds from explicit limits.
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Tightest bounds around the finite points, or `None` if there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        points
            .into_iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .fold(None, |acc: Option<Self>, (x, y)| {
                let point = Self::new(x, x, y, y);
                Some(match acc {
                    None => point,
                    Some(mut b) => {
                        b.expand_to_include(&point);
                        b
                    }
                })
            })
    }

    /// Grow to cover `other` as well.
    pub fn expand_to_include(&mut self, other: &PlotBounds) {
        self.x_min = self.x_min.min(other.x_min);
        self.x_max = self.x_max.max(other.x_max);
        self.y_min = self.y_min.min(other.y_min);
        self.y_max = self.y_max.max(other.y_max);
    }

    /// Pad every side by a fraction of the span. A zero span is padded by
    /// half a unit so the range never collapses.
    pub fn with_margin(&self, margin_percent: f64) -> Self {
        let pad = |lo: f64, hi: f64| {
            let span = hi - lo;
            if span > 0.0 { span * margin_percent } else { 0.5 }
        };
        let x_margin = pad(self.x_min, self.x_max);
        let y_margin = pad(self.y_min, self.y_max);
        Self {
            x_min: self.x_min - x_margin,
            x_max: self.x_max + x_margin,
            y_min: self.y_min - y_margin,
            y_max: self.y_max + y_margin,
        }
    }

    /// Widen the shorter range so one data unit spans the same number of
    /// pixels on both axes of a `width` x `height` pixel area.
    pub fn equalize_aspect(&self, width: u32, height: u32) -> Self {
        let (w, h) = (f64::from(width.max(1)), f64::from(height.max(1)));
        let x_span = self.x_max - self.x_min;
        let y_span = self.y_max - self.y_min;
        let units_per_px = (x_span / w).max(y_span / h);
        let (x_mid, y_mid) = (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        );
        let half_x = units_per_px * w / 2.0;
        let half_y = units_per_px * h / 2.0;
        Self::new(x_mid - half_x, x_mid + half_x, y_mid - half_y, y_mid + half_y)
    }
}
