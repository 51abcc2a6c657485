//! Interactive HTML rendering through [plotly](https://docs.rs/plotly).
//!
//! Line traces map onto typed `plotly::Scatter` traces. Heatmaps and contours
//! are emitted through a small serde trace so the colour bounds, the
//! logarithmic transform and the contour levels match the plotters backend
//! exactly.

use std::path::{Path, PathBuf};

use ::plotly::common::{
    DashType, Fill, HoverInfo, Line, Marker as PlotlyMarker, MarkerSymbol, Mode, Title,
};
use ::plotly::layout::{Axis, AxisType, Layout};
use ::plotly::{Plot, Scatter as PlotlyScatter, Trace as PlotlyTrace};
use serde::Serialize;
use tracing::{debug, info};

use super::{Plotter, ensure_extension, resolve_file_name};
use crate::colornorm::ColorNorm;
use crate::error::{PlotError, PlotResult};
use crate::figure::Figure;
use crate::style::{Aspect, LineProps, LineStyle, Marker, Scale};
use crate::traces::{Contour, ContourLevels, ErrorBand, Heatmap, Histogram, Trace};

/// Registry name of this backend.
pub const BACKEND_NAME: &str = "plotly";

/// Plotly colour scale used for heatmaps and contours.
const COLOR_SCALE: &str = "Plasma";

/// How the plotly.js library is referenced by saved HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncludePlotlyJs {
    /// Load plotly.js from its CDN.
    #[default]
    Cdn,
    /// Emit only the plot `<div>` and script; the page embedding it provides plotly.js.
    Omit,
}

/// Output settings for [`PlotlyPlotter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlotlyOptions {
    /// Library reference written into saved files.
    pub include_plotlyjs: IncludePlotlyJs,
}

impl PlotlyOptions {
    /// CDN-backed output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how plotly.js is referenced.
    pub const fn with_include_plotlyjs(mut self, include: IncludePlotlyJs) -> Self {
        self.include_plotlyjs = include;
        self
    }
}

/// A figure translated into a [`plotly::Plot`](::plotly::Plot).
#[derive(Clone)]
pub struct PlotlyPlotter {
    plot: Plot,
    title: Option<String>,
    options: PlotlyOptions,
}

impl PlotlyPlotter {
    /// Translate `figure` with default options.
    pub fn new(figure: &Figure) -> PlotResult<Self> {
        Self::with_options(figure, PlotlyOptions::default())
    }

    /// Translate `figure`.
    ///
    /// # Errors
    ///
    /// Returns [`PlotError::Unsupported`] for contours with unevenly spaced
    /// explicit levels, which plotly cannot express.
    pub fn with_options(figure: &Figure, options: PlotlyOptions) -> PlotResult<Self> {
        let mut plot = Plot::new();
        for (index, trace) in figure.traces().iter().enumerate() {
            match trace {
                Trace::Scatter(s) => plot.add_trace(line_trace(s.x(), s.y(), s.line(), s.label())),
                Trace::Kde(k) => plot.add_trace(line_trace(k.x(), k.y(), k.line(), k.label())),
                Trace::ErrorBand(band) => add_errorband(&mut plot, band, index),
                Trace::Histogram(hist) => add_histogram(&mut plot, hist, index),
                Trace::Heatmap(mesh) => plot.add_trace(ColorMeshTrace::heatmap(mesh).into_trace()?),
                Trace::Contour(contour) => plot.add_trace(ColorMeshTrace::contour(contour)?.into_trace()?),
            }
        }
        plot.set_layout(figure_layout(figure));

        debug!(
            traces = figure.traces().len(),
            title = figure.title().unwrap_or_default(),
            "plotly figure built"
        );
        Ok(Self {
            plot,
            title: figure.title().map(str::to_owned),
            options,
        })
    }

    /// Boxed constructor matching [`BackendFactory`](super::BackendFactory).
    pub fn factory(figure: &Figure) -> PlotResult<Box<dyn Plotter>> {
        Ok(Box::new(Self::new(figure)?))
    }

    /// The underlying plotly plot.
    pub const fn plot(&self) -> &Plot {
        &self.plot
    }

    /// Output settings.
    pub const fn options(&self) -> PlotlyOptions {
        self.options
    }

    /// The plot as a JSON document (`data` and `layout`).
    pub fn to_json(&self) -> PlotResult<serde_json::Value> {
        serde_json::from_str(&self.plot.to_json())
            .map_err(|e| PlotError::render(BACKEND_NAME, e.to_string()))
    }

    /// The HTML that [`Plotter::save`] writes.
    pub fn to_html(&self) -> String {
        match self.options.include_plotlyjs {
            IncludePlotlyJs::Cdn => self.plot.to_html(),
            IncludePlotlyJs::Omit => self.plot.to_inline_html(None),
        }
    }
}

impl Plotter for PlotlyPlotter {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn show(&self) -> PlotResult<()> {
        self.plot.show();
        Ok(())
    }

    fn save(&self, file_name: Option<&Path>) -> PlotResult<PathBuf> {
        let path = ensure_extension(resolve_file_name(file_name, self.title())?, "html");
        std::fs::write(&path, self.to_html())?;
        info!(path = %path.display(), "plot saved");
        Ok(path)
    }
}

/// Plotly drawing mode for a marker / line-style pair.
fn mode_for(marker: Option<Marker>, linestyle: LineStyle) -> Mode {
    match (marker, linestyle.is_visible()) {
        (None, _) => Mode::Lines,
        (Some(_), true) => Mode::LinesMarkers,
        (Some(_), false) => Mode::Markers,
    }
}

fn marker_symbol(marker: Marker) -> MarkerSymbol {
    match marker {
        Marker::Point => MarkerSymbol::Circle,
        Marker::Plus => MarkerSymbol::Cross,
        Marker::Cross => MarkerSymbol::X,
        Marker::Circle => MarkerSymbol::CircleOpen,
        Marker::Star => MarkerSymbol::Star,
    }
}

fn dash_type(linestyle: LineStyle) -> Option<DashType> {
    match linestyle {
        LineStyle::Dashed => Some(DashType::Dash),
        LineStyle::Dotted => Some(DashType::Dot),
        LineStyle::Solid | LineStyle::None => None,
    }
}

fn plotly_line(props: &LineProps) -> Line {
    let line = Line::new().color(props.color.to_hex()).width(props.linewidth);
    match dash_type(props.linestyle) {
        Some(dash) => line.dash(dash),
        None => line,
    }
}

fn plotly_marker(props: &LineProps) -> PlotlyMarker {
    let marker = PlotlyMarker::new().color(props.color.to_hex());
    match props.marker {
        Some(m) => marker.symbol(marker_symbol(m)),
        None => marker,
    }
}

fn line_trace(x: &[f64], y: &[f64], props: &LineProps, label: Option<&str>) -> Box<PlotlyScatter<f64, f64>> {
    let trace = PlotlyScatter::new(x.to_vec(), y.to_vec())
        .mode(mode_for(props.marker, props.linestyle))
        .line(plotly_line(props))
        .marker(plotly_marker(props))
        .opacity(props.alpha)
        .show_legend(label.is_some());
    match label {
        Some(name) => trace.name(name),
        None => trace,
    }
}

fn add_errorband(plot: &mut Plot, band: &ErrorBand, index: usize) {
    let group = format!("trace{index}");
    let (px, py): (Vec<f64>, Vec<f64>) = band.band_polygon().into_iter().unzip();
    let shade = PlotlyScatter::new(px, py)
        .mode(Mode::Lines)
        .fill(Fill::ToSelf)
        .fill_color(band.line().color.to_hex())
        .line(Line::new().width(0.0))
        .opacity(band.band_alpha())
        .hover_info(HoverInfo::Skip)
        .show_legend(false)
        .legend_group(&group);
    plot.add_trace(shade);
    plot.add_trace(line_trace(band.x(), band.y(), band.line(), band.label()).legend_group(&group));
}

/// A histogram is a staircase line plus one point per bin carrying the hover
/// text. The points are invisible unless the style asks for markers.
fn add_histogram(plot: &mut Plot, hist: &Histogram, index: usize) {
    let group = format!("trace{index}");
    let props = hist.line();
    let draw_steps = props.linestyle.is_visible() || props.marker.is_none();

    if draw_steps {
        let steps = PlotlyScatter::new(hist.finite_step_x(), hist.step_y().to_vec())
            .mode(Mode::Lines)
            .line(plotly_line(props))
            .opacity(props.alpha)
            .hover_info(HoverInfo::Skip)
            .show_legend(hist.label().is_some())
            .legend_group(&group);
        let steps = match hist.label() {
            Some(name) => steps.name(name),
            None => steps,
        };
        plot.add_trace(steps);
    }

    let (cx, cy): (Vec<f64>, Vec<f64>) = hist.marker_positions().into_iter().unzip();
    let text: Vec<String> = hist
        .bin_ranges()
        .iter()
        .zip(hist.bin_counts())
        .map(|((lo, hi), count)| format!("Bin: [{lo}, {hi}]<br>Count: {count}"))
        .collect();
    let marker = match props.marker {
        Some(_) => plotly_marker(props),
        None => PlotlyMarker::new().color(props.color.to_hex()).opacity(0.0),
    };
    let centres = PlotlyScatter::new(cx, cy)
        .mode(Mode::Markers)
        .marker(marker)
        .opacity(props.alpha)
        .text_array(text)
        .hover_template("%{text}")
        .show_legend(!draw_steps && hist.label().is_some())
        .legend_group(&group);
    let centres = match hist.label() {
        Some(name) if !draw_steps => centres.name(name),
        _ => centres,
    };
    plot.add_trace(centres);
}

#[derive(Debug, Clone, Serialize)]
struct ColorBar {
    title: ColorBarTitle,
}

#[derive(Debug, Clone, Serialize)]
struct ColorBarTitle {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct Contours {
    coloring: &'static str,
    showlines: bool,
    showlabels: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<f64>,
}

/// `heatmap` or `contour` trace in colour-scale space. Hover shows the raw
/// value from `customdata`.
#[derive(Debug, Clone, Serialize)]
struct ColorMeshTrace {
    #[serde(rename = "type")]
    kind: &'static str,
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<Vec<f64>>,
    customdata: Vec<Vec<f64>>,
    zmin: f64,
    zmax: f64,
    zauto: bool,
    colorscale: &'static str,
    opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    showlegend: bool,
    colorbar: ColorBar,
    hovertemplate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    autocontour: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contours: Option<Contours>,
}

impl ColorMeshTrace {
    fn heatmap(mesh: &Heatmap) -> Self {
        Self::with_norm(mesh, &mesh.color_norm())
    }

    fn with_norm(mesh: &Heatmap, norm: &ColorNorm) -> Self {
        let rows = |a: &ndarray::Array2<f64>| a.rows().into_iter().map(|r| r.to_vec()).collect();
        let zlabel = mesh.zlabel().unwrap_or("z");
        let colorbar_title = match mesh.zscale() {
            Scale::Log => format!("log10 {zlabel}"),
            Scale::Linear => zlabel.to_owned(),
        };
        Self {
            kind: "heatmap",
            x: mesh.x().to_vec(),
            y: mesh.y().to_vec(),
            z: rows(norm.values()),
            customdata: rows(mesh.z()),
            zmin: norm.zmin(),
            zmax: norm.zmax(),
            zauto: false,
            colorscale: COLOR_SCALE,
            opacity: mesh.alpha(),
            name: mesh.label().map(str::to_owned),
            showlegend: false,
            colorbar: ColorBar {
                title: ColorBarTitle {
                    text: colorbar_title,
                },
            },
            hovertemplate: format!("x: %{{x}}<br>y: %{{y}}<br>{zlabel}: %{{customdata}}<extra></extra>"),
            autocontour: None,
            contours: None,
        }
    }

    fn contour(contour: &Contour) -> PlotResult<Self> {
        let norm = contour.mesh().color_norm();
        let mut trace = Self::with_norm(contour.mesh(), &norm);
        let levels = contour.resolved_levels(&norm);
        if let ContourLevels::Values(_) = contour.levels() {
            check_uniform(&levels)?;
        }

        let contours = match levels.as_slice() {
            [] => Contours {
                coloring: "heatmap",
                showlines: false,
                showlabels: false,
                start: None,
                end: None,
                size: None,
            },
            [first, rest @ ..] => {
                let last = rest.last().copied().unwrap_or(*first);
                let size = rest.first().map_or(1.0, |second| second - first);
                Contours {
                    coloring: "heatmap",
                    showlines: true,
                    showlabels: true,
                    start: Some(*first),
                    end: Some(last),
                    size: Some(size),
                }
            }
        };
        trace.kind = "contour";
        trace.autocontour = Some(false);
        trace.contours = Some(contours);
        Ok(trace)
    }

    /// Serialize eagerly into a plotly trace.
    fn into_trace(self) -> PlotResult<Box<JsonTrace>> {
        let value = serde_json::to_value(&self)
            .map_err(|e| PlotError::render(BACKEND_NAME, format!("cannot serialize {} trace: {e}", self.kind)))?;
        Ok(Box::new(JsonTrace(value)))
    }
}

/// A trace already in its JSON form.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
struct JsonTrace(serde_json::Value);

impl PlotlyTrace for JsonTrace {
    fn to_json(&self) -> String {
        self.0.to_string()
    }
}

/// Plotly contours are described by start, end and step, so explicit levels
/// must be evenly spaced.
fn check_uniform(levels: &[f64]) -> PlotResult<()> {
    if levels.len() < 3 {
        return Ok(());
    }
    let step = levels[1] - levels[0];
    let tolerance = 1e-9 * (levels[levels.len() - 1] - levels[0]).abs();
    let uniform = levels
        .windows(2)
        .all(|w| ((w[1] - w[0]) - step).abs() <= tolerance);
    if uniform {
        Ok(())
    } else {
        Err(PlotError::unsupported(
            BACKEND_NAME,
            "contour levels that are not evenly spaced",
        ))
    }
}

fn title_text(figure: &Figure) -> Option<String> {
    let subtitle = figure
        .subtitle()
        .map(|s| format!("<br><sup>{}</sup>", s.replace('\n', "<br>")));
    match (figure.displayed_title(), subtitle) {
        (Some(title), Some(sub)) => Some(format!("{title}{sub}")),
        (Some(title), None) => Some(title.to_owned()),
        (None, Some(sub)) => Some(sub),
        (None, None) => None,
    }
}

fn axis(label: Option<&str>, scale: Scale) -> Axis {
    let axis = match label {
        Some(text) => Axis::new().title(Title::with_text(text)),
        None => Axis::new(),
    };
    match scale {
        Scale::Log => axis.type_(AxisType::Log),
        Scale::Linear => axis,
    }
}

fn figure_layout(figure: &Figure) -> Layout {
    let x_axis = axis(figure.xlabel(), figure.xscale());
    let mut y_axis = axis(figure.ylabel(), figure.yscale());
    if figure.aspect() == Some(Aspect::Equal) {
        y_axis = y_axis.scale_anchor("x").scale_ratio(1.0);
    }

    let layout = Layout::new().x_axis(x_axis).y_axis(y_axis);
    match title_text(figure) {
        Some(text) => layout.title(Title::with_text(text)),
        None => layout,
    }
}
