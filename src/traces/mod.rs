//! Renderer-agnostic trace models.
//!
//! A trace is validated completely at construction and is immutable
//! afterwards. Derived geometry (histogram staircases, KDE curves, band
//! polygons) is computed once so every backend draws exactly the same data.

mod colormesh;
mod errorband;
mod histogram;
mod kde;
mod scatter;

use std::fmt;

pub use colormesh::{ColorMeshOptions, Contour, ContourLevels, ContourOptions, Heatmap};
pub use errorband::ErrorBand;
pub use histogram::{Bins, Histogram, HistogramOptions, MAX_BINS, NanPolicy};
pub use kde::{Bandwidth, Kde, KdeOptions};
pub use scatter::Scatter;

use crate::error::{PlotError, PlotResult};

/// Every drawable element a [`Figure`](crate::Figure) can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    /// Connected points and/or markers.
    Scatter(Scatter),
    /// A line with a shaded uncertainty band.
    ErrorBand(ErrorBand),
    /// A binned distribution drawn as a staircase.
    Histogram(Histogram),
    /// A Gaussian kernel density estimate.
    Kde(Kde),
    /// A colour-mapped grid.
    Heatmap(Heatmap),
    /// A colour-mapped grid with iso-value lines.
    Contour(Contour),
}

/// Discriminant of [`Trace`], used in log and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceKind {
    /// [`Trace::Scatter`]
    Scatter,
    /// [`Trace::ErrorBand`]
    ErrorBand,
    /// [`Trace::Histogram`]
    Histogram,
    /// [`Trace::Kde`]
    Kde,
    /// [`Trace::Heatmap`]
    Heatmap,
    /// [`Trace::Contour`]
    Contour,
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TraceKind::Scatter => "scatter",
            TraceKind::ErrorBand => "errorband",
            TraceKind::Histogram => "histogram",
            TraceKind::Kde => "kde",
            TraceKind::Heatmap => "heatmap",
            TraceKind::Contour => "contour",
        };
        f.write_str(name)
    }
}

impl Trace {
    /// Which variant this is.
    pub const fn kind(&self) -> TraceKind {
        match self {
            Trace::Scatter(_) => TraceKind::Scatter,
            Trace::ErrorBand(_) => TraceKind::ErrorBand,
            Trace::Histogram(_) => TraceKind::Histogram,
            Trace::Kde(_) => TraceKind::Kde,
            Trace::Heatmap(_) => TraceKind::Heatmap,
            Trace::Contour(_) => TraceKind::Contour,
        }
    }

    /// Legend label, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Trace::Scatter(t) => t.label(),
            Trace::ErrorBand(t) => t.label(),
            Trace::Histogram(t) => t.label(),
            Trace::Kde(t) => t.label(),
            Trace::Heatmap(t) => t.label(),
            Trace::Contour(t) => t.label(),
        }
    }
}

impl From<Scatter> for Trace {
    fn from(t: Scatter) -> Self {
        Trace::Scatter(t)
    }
}

impl From<ErrorBand> for Trace {
    fn from(t: ErrorBand) -> Self {
        Trace::ErrorBand(t)
    }
}

impl From<Histogram> for Trace {
    fn from(t: Histogram) -> Self {
        Trace::Histogram(t)
    }
}

impl From<Kde> for Trace {
    fn from(t: Kde) -> Self {
        Trace::Kde(t)
    }
}

impl From<Heatmap> for Trace {
    fn from(t: Heatmap) -> Self {
        Trace::Heatmap(t)
    }
}

impl From<Contour> for Trace {
    fn from(t: Contour) -> Self {
        Trace::Contour(t)
    }
}

/// Fail unless two coordinate sequences have the same length.
pub(crate) fn check_same_len(name_a: &str, a: usize, name_b: &str, b: usize) -> PlotResult<()> {
    if a != b {
        return Err(PlotError::invalid_value(
            name_b,
            format!("length {b} does not match length {a} of '{name_a}'"),
        ));
    }
    Ok(())
}
