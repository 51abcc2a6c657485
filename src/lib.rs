// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::box_collection)] // Warns on boxed `Vec`, `String`, etc.
#![warn(clippy::vec_box)] // Avoids using `Vec<Box<T>>` when unnecessary
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![warn(missing_docs)]

//! # unified_plot
//!
//! One figure model, several plotting libraries. Describe a plot once as a
//! [`Figure`] holding validated traces, then hand it to a backend:
//!
//! - `plotly`: interactive standalone HTML (feature `plotly-backend`)
//! - `plotters`: PNG, BMP, JPEG or SVG images (feature `plotters-backend`)
//!
//! Both are enabled by default.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unified_plot::backends::Plotter;
//! use unified_plot::backends::plotly::PlotlyPlotter;
//! use unified_plot::{Figure, HistogramOptions, Marker, TraceStyle};
//!
//! let mut figure = Figure::new().with_title("Samples").with_xlabel("value");
//! figure
//!     .scatter([0, 1, 2], [0, 1, 4], TraceStyle::new().with_label("squares"))?
//!     .histogram(
//!         [0.0, 0.0, 1.0, 1.0, 1.0, 2.0],
//!         HistogramOptions::new(),
//!         TraceStyle::new().with_marker(Marker::Point),
//!     )?;
//!
//! let plot = PlotlyPlotter::new(&figure)?;
//! plot.save(None)?; // writes "Samples.html"
//! # Ok::<(), unified_plot::PlotError>(())
//! ```
//!
//! ## Traces
//!
//! | Trace        | Built from                          | Drawn as                          |
//! |--------------|-------------------------------------|-----------------------------------|
//! | [`Scatter`]  | x, y                                | line and/or markers               |
//! | [`ErrorBand`]| x, y, lower and upper offsets       | line over a half-opacity band     |
//! | [`Histogram`]| raw samples and a binning rule      | staircase with open-ended tails   |
//! | [`Kde`]      | raw samples and a bandwidth rule    | smooth density line               |
//! | [`Heatmap`]  | x, y, z grid                        | colour-mapped cells               |
//! | [`Contour`]  | x, y, z grid and levels             | colour-mapped cells and isolines  |
//!
//! Traces without an explicit colour take the next colour of the figure's
//! palette.
//!
//! ## Error Handling
//!
//! Every fallible call returns [`PlotResult`]. Inputs are validated when a
//! trace or property is created, never at draw time:
//!
//! ```rust
//! use unified_plot::{ErrorKind, Figure, PlotError, TraceStyle};
//!
//! let mut figure = Figure::new();
//! let err = figure
//!     .scatter([0, 1, 2], [0, 1], TraceStyle::new())
//!     .unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Value);
//!
//! match err {
//!     PlotError::Type(e) => eprintln!("wrong type: {e}"),
//!     PlotError::Value(e) => eprintln!("invalid value: {e}"),
//!     other => eprintln!("{other}"),
//! }
//! ```
//!
//! ## Loosely typed input
//!
//! Styles and figure properties can also come from JSON-like maps, e.g. when
//! they are read from a configuration file:
//!
//! ```rust
//! use serde_json::json;
//! use unified_plot::{Figure, TraceStyle};
//!
//! let style = TraceStyle::from_kwargs(
//!     json!({"color": [255, 0, 0], "linestyle": "dashed", "alpha": "0.5"})
//!         .as_object()
//!         .unwrap(),
//! )
//! .unwrap();
//! assert_eq!(style.alpha, Some(0.5));
//!
//! let mut figure = Figure::new();
//! figure
//!     .set([("title", json!("Run 3")), ("yscale", json!("log"))])
//!     .unwrap();
//! assert_eq!(figure.title(), Some("Run 3"));
//! ```

pub mod backends;
pub mod bounds;
pub mod colornorm;
mod error;
pub mod figure;
pub mod isolines;
pub mod manager;
pub mod style;
#[cfg(test)]
mod testing;
pub mod traces;
pub mod validation;

pub use crate::backends::{BackendFactory, Plotter};
pub use crate::error::{
    ErrorKind, PlotError, PlotResult, TypeError, UnsupportedError, ValueError,
};
pub use crate::figure::{Figure, FigureProperty};
pub use crate::manager::{Manager, SaveLocation};
pub use crate::style::{Aspect, LineStyle, Marker, Rgb, Scale, TraceStyle};
pub use crate::traces::{
    Bandwidth, Bins, ColorMeshOptions, Contour, ContourLevels, ContourOptions, ErrorBand,
    Heatmap, Histogram, HistogramOptions, Kde, KdeOptions, NanPolicy, Scatter, Trace, TraceKind,
};
