//! Visual style vocabulary shared by traces, figures and backends.
//!
//! Backends translate these backend-neutral values into their own types, e.g.
//! [`Marker::Plus`] becomes a Plotly `cross` symbol or a drawn plus sign on a
//! bitmap.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{PlotError, PlotResult};
use crate::validation;

/// An RGB colour with channels normalised to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
}

impl Rgb {
    /// Build a colour from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f64::from(r) / 255.0,
            g: f64::from(g) / 255.0,
            b: f64::from(b) / 255.0,
        }
    }

    /// Channels scaled back to 8 bits.
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let scale = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        (scale(self.r), scale(self.g), scale(self.b))
    }

    /// Lowercase `#rrggbb` representation.
    pub fn to_hex(self) -> String {
        let (r, g, b) = self.to_rgb8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

/// Colours handed out, in order, to traces created without an explicit colour.
pub const DEFAULT_PALETTE: [(u8, u8, u8); 9] = [
    (255, 59, 59),
    (52, 71, 217),
    (4, 168, 2),
    (224, 146, 0),
    (224, 0, 183),
    (0, 230, 214),
    (140, 0, 0),
    (9, 0, 140),
    (107, 0, 96),
];

/// Default palette entry at `index`, wrapping around.
pub fn palette_color(index: usize) -> Rgb {
    let (r, g, b) = DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()];
    Rgb::from_rgb8(r, g, b)
}

/// Marker drawn at every data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `.` small filled dot
    Point,
    /// `o` open circle
    Circle,
    /// `+` plus sign
    Plus,
    /// `x` diagonal cross
    Cross,
    /// `*` star
    Star,
}

impl Marker {
    /// The single-character token for this marker.
    pub const fn token(self) -> &'static str {
        match self {
            Marker::Point => ".",
            Marker::Circle => "o",
            Marker::Plus => "+",
            Marker::Cross => "x",
            Marker::Star => "*",
        }
    }
}

impl FromStr for Marker {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "." => Ok(Marker::Point),
            "o" => Ok(Marker::Circle),
            "+" => Ok(Marker::Plus),
            "x" => Ok(Marker::Cross),
            "*" => Ok(Marker::Star),
            other => Err(PlotError::invalid_value(
                "marker",
                format!("'{other}' is not one of '.', 'o', '+', 'x', '*'"),
            )),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Stroke pattern of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineStyle {
    /// Continuous line.
    #[default]
    Solid,
    /// Short dots.
    Dotted,
    /// Dashes.
    Dashed,
    /// No line at all; only markers (if any) are drawn.
    None,
}

impl LineStyle {
    /// The token accepted by [`FromStr`].
    pub const fn token(self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dotted => "dotted",
            LineStyle::Dashed => "dashed",
            LineStyle::None => "none",
        }
    }

    /// Whether any line is drawn.
    pub const fn is_visible(self) -> bool {
        !matches!(self, LineStyle::None)
    }
}

impl FromStr for LineStyle {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(LineStyle::Solid),
            "dotted" => Ok(LineStyle::Dotted),
            "dashed" => Ok(LineStyle::Dashed),
            "none" => Ok(LineStyle::None),
            other => Err(PlotError::invalid_value(
                "linestyle",
                format!("'{other}' is not one of 'solid', 'dotted', 'dashed', 'none'"),
            )),
        }
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Axis or colour scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scale {
    /// Linear scale, token `lin`.
    #[default]
    Linear,
    /// Base-10 logarithmic scale, token `log`.
    Log,
}

impl Scale {
    /// The token accepted by [`FromStr`].
    pub const fn token(self) -> &'static str {
        match self {
            Scale::Linear => "lin",
            Scale::Log => "log",
        }
    }

    /// True for [`Scale::Log`].
    pub const fn is_log(self) -> bool {
        matches!(self, Scale::Log)
    }
}

impl FromStr for Scale {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lin" => Ok(Scale::Linear),
            "log" => Ok(Scale::Log),
            other => Err(PlotError::invalid_value(
                "scale",
                format!("'{other}' is not one of 'lin', 'log'"),
            )),
        }
    }
}

/// Aspect-ratio constraint of the plotting area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aspect {
    /// One data unit has the same length on both axes.
    Equal,
}

impl FromStr for Aspect {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Aspect::Equal),
            other => Err(PlotError::invalid_value(
                "aspect",
                format!("'{other}' is not 'equal'"),
            )),
        }
    }
}

/// Style keys understood by [`TraceStyle::from_kwargs`].
pub const STYLE_KEYS: [&str; 6] = ["label", "color", "marker", "linestyle", "linewidth", "alpha"];

/// Optional styling supplied when a trace is created.
///
/// Every field left `None` falls back to the trace default; an unset colour is
/// taken from the figure's default palette.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraceStyle {
    /// Legend label.
    pub label: Option<String>,
    /// Explicit colour.
    pub color: Option<Rgb>,
    /// Marker; `None` draws no markers.
    pub marker: Option<Marker>,
    /// Line pattern; `None` means solid.
    pub linestyle: Option<LineStyle>,
    /// Line width in points.
    pub linewidth: Option<f64>,
    /// Opacity in `[0, 1]`.
    pub alpha: Option<f64>,
}

impl TraceStyle {
    /// Empty style; every property takes its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the legend label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the colour.
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the marker.
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Set the line style.
    pub fn with_linestyle(mut self, linestyle: LineStyle) -> Self {
        self.linestyle = Some(linestyle);
        self
    }

    /// Set the line width; validated when the trace is built.
    pub fn with_linewidth(mut self, linewidth: f64) -> Self {
        self.linewidth = Some(linewidth);
        self
    }

    /// Set the opacity; validated when the trace is built.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Build a style from loosely typed keyword arguments.
    ///
    /// Unknown keys are rejected; each known key goes through its validator.
    pub fn from_kwargs(kwargs: &Map<String, Value>) -> PlotResult<Self> {
        validation::validate_kwargs(&[], kwargs, validation::UnknownKeys::Reject)
    }

    /// Range-check the numeric fields of a style built through the typed API.
    pub(crate) fn check(&self) -> PlotResult<()> {
        if let Some(lw) = self.linewidth {
            validation::check_linewidth(lw)?;
        }
        if let Some(alpha) = self.alpha {
            validation::check_alpha(alpha)?;
        }
        Ok(())
    }
}

/// Fully resolved line styling stored on a trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineProps {
    /// Stroke and marker colour.
    pub color: Rgb,
    /// Marker; `None` draws no markers.
    pub marker: Option<Marker>,
    /// Line pattern.
    pub linestyle: LineStyle,
    /// Line width in points.
    pub linewidth: f64,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
}

/// Line width used when none is given.
pub const DEFAULT_LINEWIDTH: f64 = 1.5;

impl LineProps {
    /// Resolve a [`TraceStyle`] against a fallback colour.
    pub(crate) fn resolve(style: &TraceStyle, fallback: Rgb) -> PlotResult<Self> {
        style.check()?;
        Ok(Self {
            color: style.color.unwrap_or(fallback),
            marker: style.marker,
            linestyle: style.linestyle.unwrap_or_default(),
            linewidth: style.linewidth.unwrap_or(DEFAULT_LINEWIDTH),
            alpha: style.alpha.unwrap_or(1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx_eq::assert_approx_eq;
    use serde_json::json;

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb::from_rgb8(255, 59, 59).to_hex(), "#ff3b3b");
        assert_eq!(Rgb::from_rgb8(0, 0, 0).to_hex(), "#000000");
        let c = Rgb::from_rgb8(52, 71, 217);
        assert_approx_eq!(c.g, 71.0 / 255.0);
        assert_eq!(c.to_rgb8(), (52, 71, 217));
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(palette_color(0), palette_color(DEFAULT_PALETTE.len()));
        assert_eq!(palette_color(1).to_hex(), "#3447d9");
    }

    #[test]
    fn test_tokens_parse() {
        for m in [Marker::Point, Marker::Circle, Marker::Plus, Marker::Cross, Marker::Star] {
            assert_eq!(m.token().parse::<Marker>().ok(), Some(m));
        }
        for ls in [LineStyle::Solid, LineStyle::Dotted, LineStyle::Dashed, LineStyle::None] {
            assert_eq!(ls.token().parse::<LineStyle>().ok(), Some(ls));
        }
        assert_eq!("log".parse::<Scale>().ok(), Some(Scale::Log));
        assert!("linear".parse::<Scale>().is_err());
        assert!("square".parse::<Aspect>().is_err());
    }

    #[test]
    fn test_from_kwargs() {
        let kwargs = json!({
            "label": "signal",
            "color": [0, 0, 255],
            "marker": "o",
            "linestyle": "dashed",
            "linewidth": "2.5",
            "alpha": 0.5
        });
        let style = TraceStyle::from_kwargs(kwargs.as_object().unwrap_or(&Map::new())).unwrap();
        assert_eq!(style.label.as_deref(), Some("signal"));
        assert_eq!(style.color, Some(Rgb::from_rgb8(0, 0, 255)));
        assert_eq!(style.marker, Some(Marker::Circle));
        assert_eq!(style.linestyle, Some(LineStyle::Dashed));
        assert_approx_eq!(style.linewidth.unwrap(), 2.5);
        assert_approx_eq!(style.alpha.unwrap(), 0.5);
    }

    #[test]
    fn test_from_kwargs_rejects_unknown_key() {
        let kwargs = json!({ "colour": [0, 0, 255] });
        let err = TraceStyle::from_kwargs(kwargs.as_object().unwrap_or(&Map::new())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_resolve_defaults() {
        let fallback = palette_color(2);
        let props = LineProps::resolve(&TraceStyle::new(), fallback).unwrap();
        assert_eq!(props.color, fallback);
        assert_eq!(props.linestyle, LineStyle::Solid);
        assert_eq!(props.marker, None);
        assert_approx_eq!(props.linewidth, DEFAULT_LINEWIDTH);
        assert_approx_eq!(props.alpha, 1.0);

        let bad = TraceStyle::new().with_alpha(1.5);
        assert!(LineProps::resolve(&bad, fallback).is_err());
    }
}
