//! The backend-independent figure model.
//!
//! A [`Figure`] is a list of traces plus a handful of presentation properties
//! (title, axis labels and scales, aspect). It knows nothing about how it will
//! be drawn; a [`Plotter`](crate::backends::Plotter) takes a snapshot of it
//! and renders that with a concrete library.
//!
//! Properties can be set through typed builders or, for loosely typed sources,
//! through [`Figure::set`] which takes name/value pairs and validates the whole
//! batch before applying any of it.

use ndarray::Array2;
use num_traits::ToPrimitive;
use serde_json::Value;
use tracing::debug;

use crate::error::{PlotError, PlotResult};
use crate::style::{Aspect, Rgb, Scale, TraceStyle, palette_color};
use crate::traces::{
    ColorMeshOptions, Contour, ContourOptions, ErrorBand, Heatmap, Histogram, HistogramOptions,
    Kde, KdeOptions, Scatter, Trace,
};

/// One validated figure property.
#[derive(Debug, Clone, PartialEq)]
pub enum FigureProperty {
    /// Main title; `None` removes it.
    Title(Option<String>),
    /// Whether the title is drawn.
    ShowTitle(bool),
    /// Secondary line under the title.
    Subtitle(Option<String>),
    /// X-axis label.
    XLabel(Option<String>),
    /// Y-axis label.
    YLabel(Option<String>),
    /// X-axis scale.
    XScale(Scale),
    /// Y-axis scale.
    YScale(Scale),
    /// Aspect constraint; `None` lets the backend choose.
    Aspect(Option<Aspect>),
}

impl FigureProperty {
    /// Every property name accepted by [`FigureProperty::parse`].
    pub const NAMES: [&'static str; 8] = [
        "title",
        "show_title",
        "subtitle",
        "xlabel",
        "ylabel",
        "xscale",
        "yscale",
        "aspect",
    ];

    /// Validate `value` as the property called `name`.
    pub fn parse(name: &str, value: &Value) -> PlotResult<Self> {
        match name {
            "title" => Ok(Self::Title(text_value(name, value)?)),
            "show_title" => match value {
                Value::Bool(show) => Ok(Self::ShowTitle(*show)),
                other => Err(PlotError::invalid_type(
                    name,
                    "boolean",
                    other.to_string(),
                )),
            },
            "subtitle" => Ok(Self::Subtitle(text_value(name, value)?)),
            "xlabel" => Ok(Self::XLabel(text_value(name, value)?)),
            "ylabel" => Ok(Self::YLabel(text_value(name, value)?)),
            "xscale" => Ok(Self::XScale(scale_value(name, value)?)),
            "yscale" => Ok(Self::YScale(scale_value(name, value)?)),
            "aspect" => match value {
                Value::Null => Ok(Self::Aspect(None)),
                Value::String(s) => s.parse().map(|a| Self::Aspect(Some(a))),
                other => Err(PlotError::invalid_value(
                    name,
                    format!("must be 'equal' or null, got {other}"),
                )),
            },
            other => Err(PlotError::invalid_value(
                other,
                format!("not a figure property; expected one of {:?}", Self::NAMES),
            )),
        }
    }

    /// The property name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::ShowTitle(_) => "show_title",
            Self::Subtitle(_) => "subtitle",
            Self::XLabel(_) => "xlabel",
            Self::YLabel(_) => "ylabel",
            Self::XScale(_) => "xscale",
            Self::YScale(_) => "yscale",
            Self::Aspect(_) => "aspect",
        }
    }
}

/// Text properties take strings, or numbers and booleans rendered as text.
fn text_value(name: &str, value: &Value) -> PlotResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(PlotError::invalid_type(name, "string", other.to_string())),
    }
}

fn scale_value(name: &str, value: &Value) -> PlotResult<Scale> {
    match value {
        Value::String(s) => s.parse().map_err(|_| {
            PlotError::invalid_value(name, format!("must be one of 'lin', 'log', got '{s}'"))
        }),
        other => Err(PlotError::invalid_value(
            name,
            format!("must be one of 'lin', 'log', got {other}"),
        )),
    }
}

/// A declarative plot: presentation properties and an ordered list of traces.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    title: Option<String>,
    show_title: bool,
    subtitle: Option<String>,
    xlabel: Option<String>,
    ylabel: Option<String>,
    xscale: Scale,
    yscale: Scale,
    aspect: Option<Aspect>,
    traces: Vec<Trace>,
    palette_cursor: usize,
}

impl Default for Figure {
    fn default() -> Self {
        Self {
            title: None,
            show_title: true,
            subtitle: None,
            xlabel: None,
            ylabel: None,
            xscale: Scale::Linear,
            yscale: Scale::Linear,
            aspect: None,
            traces: Vec::new(),
            palette_cursor: 0,
        }
    }
}

impl Figure {
    /// An empty figure with a visible (but unset) title and linear axes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Show or hide the title.
    pub const fn with_show_title(mut self, show: bool) -> Self {
        self.show_title = show;
        self
    }

    /// Set the subtitle.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Set the x-axis label.
    pub fn with_xlabel(mut self, xlabel: impl Into<String>) -> Self {
        self.xlabel = Some(xlabel.into());
        self
    }

    /// Set the y-axis label.
    pub fn with_ylabel(mut self, ylabel: impl Into<String>) -> Self {
        self.ylabel = Some(ylabel.into());
        self
    }

    /// Set the x-axis scale.
    pub const fn with_xscale(mut self, scale: Scale) -> Self {
        self.xscale = scale;
        self
    }

    /// Set the y-axis scale.
    pub const fn with_yscale(mut self, scale: Scale) -> Self {
        self.yscale = scale;
        self
    }

    /// Set the aspect constraint.
    pub const fn with_aspect(mut self, aspect: Option<Aspect>) -> Self {
        self.aspect = aspect;
        self
    }

    /// Apply several loosely typed properties at once.
    ///
    /// Every name and value is validated first; if any is invalid the figure
    /// is left untouched.
    pub fn set<I, K>(&mut self, properties: I) -> PlotResult<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let parsed = properties
            .into_iter()
            .map(|(name, value)| FigureProperty::parse(name.as_ref(), &value))
            .collect::<PlotResult<Vec<_>>>()?;
        for property in parsed {
            self.apply(property);
        }
        Ok(())
    }

    /// Apply one already validated property.
    pub fn apply(&mut self, property: FigureProperty) {
        match property {
            FigureProperty::Title(v) => self.title = v,
            FigureProperty::ShowTitle(v) => self.show_title = v,
            FigureProperty::Subtitle(v) => self.subtitle = v,
            FigureProperty::XLabel(v) => self.xlabel = v,
            FigureProperty::YLabel(v) => self.ylabel = v,
            FigureProperty::XScale(v) => self.xscale = v,
            FigureProperty::YScale(v) => self.yscale = v,
            FigureProperty::Aspect(v) => self.aspect = v,
        }
    }

    /// Title, if set.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Whether the title is drawn.
    pub const fn show_title(&self) -> bool {
        self.show_title
    }

    /// The title if it is set and visible.
    pub fn displayed_title(&self) -> Option<&str> {
        self.title().filter(|_| self.show_title)
    }

    /// Subtitle, if set.
    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    /// X-axis label, if set.
    pub fn xlabel(&self) -> Option<&str> {
        self.xlabel.as_deref()
    }

    /// Y-axis label, if set.
    pub fn ylabel(&self) -> Option<&str> {
        self.ylabel.as_deref()
    }

    /// X-axis scale.
    pub const fn xscale(&self) -> Scale {
        self.xscale
    }

    /// Y-axis scale.
    pub const fn yscale(&self) -> Scale {
        self.yscale
    }

    /// Aspect constraint.
    pub const fn aspect(&self) -> Option<Aspect> {
        self.aspect
    }

    /// Traces in insertion order.
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// The colour the next trace without an explicit colour will get.
    pub fn next_default_color(&self) -> Rgb {
        palette_color(self.palette_cursor)
    }

    /// Append a pre-built trace. Its colour is kept as is.
    pub fn add_trace(&mut self, trace: impl Into<Trace>) -> &mut Self {
        let trace = trace.into();
        debug!(kind = %trace.kind(), index = self.traces.len(), "trace added");
        self.traces.push(trace);
        self
    }

    /// Fill in a palette colour when none was given. Returns whether the
    /// palette was used so the cursor moves only once the trace is accepted.
    fn colorize(&self, mut style: TraceStyle) -> (TraceStyle, bool) {
        if style.color.is_some() {
            return (style, false);
        }
        style.color = Some(self.next_default_color());
        (style, true)
    }

    fn push_colored(&mut self, trace: Trace, used_palette: bool) {
        if used_palette {
            self.palette_cursor += 1;
        }
        self.add_trace(trace);
    }

    /// Add a scatter trace.
    pub fn scatter<X, Y, TX, TY>(&mut self, x: X, y: Y, style: TraceStyle) -> PlotResult<&mut Self>
    where
        X: IntoIterator<Item = TX>,
        Y: IntoIterator<Item = TY>,
        TX: ToPrimitive,
        TY: ToPrimitive,
    {
        let (style, used) = self.colorize(style);
        let trace = Scatter::new(x, y, style)?;
        self.push_colored(trace.into(), used);
        Ok(self)
    }

    /// Add a line with an asymmetric error band.
    pub fn errorband<X, Y, L, H, TX, TY, TL, TH>(
        &mut self,
        x: X,
        y: Y,
        lower: L,
        higher: H,
        style: TraceStyle,
    ) -> PlotResult<&mut Self>
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
        let (style, used) = self.colorize(style);
        let trace = ErrorBand::new(x, y, lower, higher, style)?;
        self.push_colored(trace.into(), used);
        Ok(self)
    }

    /// Add a histogram of `samples`.
    pub fn histogram<S, T>(
        &mut self,
        samples: S,
        options: HistogramOptions,
        style: TraceStyle,
    ) -> PlotResult<&mut Self>
    where
        S: IntoIterator<Item = T>,
        T: ToPrimitive,
    {
        let (style, used) = self.colorize(style);
        let trace = Histogram::new(samples, options, style)?;
        self.push_colored(trace.into(), used);
        Ok(self)
    }

    /// Add a kernel density estimate of `samples`.
    pub fn kde<S, T>(&mut self, samples: S, options: KdeOptions, style: TraceStyle) -> PlotResult<&mut Self>
    where
        S: IntoIterator<Item = T>,
        T: ToPrimitive,
    {
        let (style, used) = self.colorize(style);
        let trace = Kde::new(samples, options, style)?;
        self.push_colored(trace.into(), used);
        Ok(self)
    }

    /// Add a heatmap. Heatmaps use a colour scale, not the palette.
    pub fn heatmap<X, Y, TX, TY>(
        &mut self,
        x: X,
        y: Y,
        z: Array2<f64>,
        options: ColorMeshOptions,
    ) -> PlotResult<&mut Self>
    where
        X: IntoIterator<Item = TX>,
        Y: IntoIterator<Item = TY>,
        TX: ToPrimitive,
        TY: ToPrimitive,
    {
        let trace = Heatmap::new(x, y, z, options)?;
        Ok(self.add_trace(trace))
    }

    /// Add a contour plot.
    pub fn contour<X, Y, TX, TY>(
        &mut self,
        x: X,
        y: Y,
        z: Array2<f64>,
        options: impl Into<ContourOptions>,
    ) -> PlotResult<&mut Self>
    where
        X: IntoIterator<Item = TX>,
        Y: IntoIterator<Item = TY>,
        TX: ToPrimitive,
        TY: ToPrimitive,
    {
        let trace = Contour::new(x, y, z, options.into())?;
        Ok(self.add_trace(trace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::traces::{Bins, TraceKind};
    use serde_json::json;

    fn props(value: Value) -> Vec<(String, Value)> {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_defaults() {
        let fig = Figure::new();
        assert_eq!(fig.title(), None);
        assert!(fig.show_title());
        assert_eq!(fig.xscale(), Scale::Linear);
        assert_eq!(fig.aspect(), None);
        assert!(fig.traces().is_empty());
    }

    #[test]
    fn test_set_properties() {
        let mut fig = Figure::new();
        fig.set(props(json!({
            "title": "Velocity",
            "subtitle": "run 3\nfiltered",
            "xlabel": "t (s)",
            "ylabel": 42,
            "xscale": "log",
            "aspect": "equal",
            "show_title": false
        })))
        .unwrap();
        assert_eq!(fig.title(), Some("Velocity"));
        assert_eq!(fig.displayed_title(), None);
        assert_eq!(fig.subtitle(), Some("run 3\nfiltered"));
        assert_eq!(fig.ylabel(), Some("42"));
        assert_eq!(fig.xscale(), Scale::Log);
        assert_eq!(fig.yscale(), Scale::Linear);
        assert_eq!(fig.aspect(), Some(Aspect::Equal));
    }

    #[test]
    fn test_set_is_atomic() {
        let mut fig = Figure::new().with_title("before");
        let err = fig
            .set(vec![
                ("title", json!("after")),
                ("colour", json!("red")),
            ])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
        assert_eq!(fig.title(), Some("before"));
    }

    #[test]
    fn test_property_errors() {
        let cases = [
            ("show_title", json!("yes"), ErrorKind::Type),
            ("title", json!([1, 2]), ErrorKind::Type),
            ("xscale", json!("linear"), ErrorKind::Value),
            ("yscale", json!(10), ErrorKind::Value),
            ("aspect", json!("square"), ErrorKind::Value),
            ("zlabel", json!("z"), ErrorKind::Value),
        ];
        for (name, value, kind) in cases {
            let err = FigureProperty::parse(name, &value).unwrap_err();
            assert_eq!(err.kind(), kind, "{name}");
        }
    }

    #[test]
    fn test_scatter_scenario() {
        let mut fig = Figure::new();
        fig.scatter([0, 1, 2], [0, 1, 4], TraceStyle::new()).unwrap();
        assert_eq!(fig.traces().len(), 1);
        let Trace::Scatter(s) = &fig.traces()[0] else {
            panic!("expected a scatter trace");
        };
        assert_eq!(s.y(), &[0.0, 1.0, 4.0]);
        assert_eq!(s.line().color, palette_color(0));
    }

    #[test]
    fn test_palette_advances_only_when_used() {
        let mut fig = Figure::new();
        fig.scatter([0.0], [0.0], TraceStyle::new()).unwrap();
        fig.scatter([0.0], [0.0], TraceStyle::new().with_color(Rgb::from_rgb8(1, 2, 3)))
            .unwrap();
        fig.heatmap([0.0], [0.0], Array2::zeros((1, 1)), ColorMeshOptions::new())
            .unwrap();
        assert_eq!(fig.next_default_color(), palette_color(1));

        // a rejected trace leaves the cursor where it was
        assert!(fig.scatter([0.0, 1.0], [0.0], TraceStyle::new()).is_err());
        assert_eq!(fig.next_default_color(), palette_color(1));
        assert_eq!(fig.traces().len(), 3);

        fig.histogram(
            [1.0, 2.0],
            HistogramOptions::new().with_bins(Bins::Count(2)),
            TraceStyle::new(),
        )
        .unwrap();
        let Trace::Histogram(h) = &fig.traces()[3] else {
            panic!("expected a histogram");
        };
        assert_eq!(h.line().color, palette_color(1));
    }

    #[test]
    fn test_palette_wraps_around() {
        let mut fig = Figure::new();
        for _ in 0..10 {
            fig.scatter([0.0], [0.0], TraceStyle::new()).unwrap();
        }
        let kinds: Vec<TraceKind> = fig.traces().iter().map(Trace::kind).collect();
        assert!(kinds.iter().all(|k| *k == TraceKind::Scatter));
        let Trace::Scatter(last) = &fig.traces()[9] else {
            panic!("expected a scatter trace");
        };
        assert_eq!(last.line().color, palette_color(0));
    }
}
