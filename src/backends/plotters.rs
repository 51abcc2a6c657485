//! Static image rendering through [plotters](https://docs.rs/plotters).
//!
//! A figure is first flattened into a [`Scene`]: primitives in axis space
//! (logarithmic axes already mapped through `log10`, dashes already cut into
//! pieces, meshes already coloured). Drawing the scene onto a plotters
//! [`DrawingArea`] is then a direct walk over the primitives, for any
//! plotters backend.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use ::plotters::coord::Shift;
use ::plotters::coord::cartesian::Cartesian2d;
use ::plotters::coord::types::RangedCoordf64;
use ::plotters::prelude::*;
use tracing::{debug, info, warn};

use super::{Plotter, ensure_extension, resolve_file_name, sanitize_file_stem};
use crate::bounds::PlotBounds;
use crate::colornorm::{ColorNorm, to_scale_space};
use crate::error::{PlotError, PlotResult};
use crate::figure::Figure;
use crate::isolines::isoline_segments;
use crate::style::{Aspect, LineProps, LineStyle, Marker, Rgb, Scale};
use crate::traces::{Contour, ErrorBand, Heatmap, Histogram, Trace};

/// Registry name of this backend.
pub const BACKEND_NAME: &str = "plotters";

const FONT: &str = "sans-serif";
const MARGIN_PERCENT: f64 = 0.05;
const X_LABEL_AREA: u32 = 40;
const Y_LABEL_AREA: u32 = 60;
const COLOR_BAR_WIDTH: u32 = 110;
const COLOR_BAR_STEPS: usize = 100;

/// Dash and gap lengths as fractions of the axes extent.
const DASH_PATTERN: (f64, f64) = (0.02, 0.012);
const DOT_PATTERN: (f64, f64) = (0.004, 0.008);

static SHOW_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Image formats [`PlottersPlotter::save`] can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Portable Network Graphics.
    #[default]
    Png,
    /// Windows bitmap.
    Bmp,
    /// JPEG.
    Jpeg,
    /// Scalable Vector Graphics.
    Svg,
}

impl ImageFormat {
    /// Canonical file extension.
    pub const fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Svg => "svg",
        }
    }

    /// Format for a file extension, case-insensitively.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "bmp" => Some(ImageFormat::Bmp),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "svg" => Some(ImageFormat::Svg),
            _ => None,
        }
    }
}

/// Output settings for [`PlottersPlotter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlottersOptions {
    /// Image size in pixels.
    pub size: (u32, u32),
    /// Format used when the file name has no extension.
    pub format: ImageFormat,
}

impl Default for PlottersOptions {
    fn default() -> Self {
        Self {
            size: (1024, 768),
            format: ImageFormat::Png,
        }
    }
}

impl PlottersOptions {
    /// 1024x768 PNG output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image size.
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Set the default format.
    pub const fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }
}

/// One drawable primitive in axis space.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneItem {
    /// An unbroken stroke.
    Line {
        /// Vertices.
        points: Vec<(f64, f64)>,
        /// Stroke colour.
        color: Rgb,
        /// Stroke width in pixels.
        width: f64,
        /// Opacity.
        alpha: f64,
    },
    /// A marker at each point.
    Markers {
        /// Marker centres.
        points: Vec<(f64, f64)>,
        /// Marker shape.
        marker: Marker,
        /// Marker colour.
        color: Rgb,
        /// Opacity.
        alpha: f64,
    },
    /// A filled polygon.
    Fill {
        /// Outline.
        points: Vec<(f64, f64)>,
        /// Fill colour.
        color: Rgb,
        /// Opacity.
        alpha: f64,
    },
    /// One colour-mapped mesh cell.
    Cell {
        /// Opposite corners.
        corners: [(f64, f64); 2],
        /// Cell colour.
        color: Rgb,
        /// Opacity.
        alpha: f64,
    },
    /// A contour level label.
    Label {
        /// Anchor point.
        position: (f64, f64),
        /// Label text.
        text: String,
    },
}

impl SceneItem {
    fn points(&self) -> Vec<(f64, f64)> {
        match self {
            SceneItem::Line { points, .. }
            | SceneItem::Markers { points, .. }
            | SceneItem::Fill { points, .. } => points.clone(),
            SceneItem::Cell { corners, .. } => corners.to_vec(),
            SceneItem::Label { position, .. } => vec![*position],
        }
    }
}

/// A legend row.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    /// Trace label.
    pub label: String,
    /// Trace colour.
    pub color: Rgb,
    /// Whether the legend sample is a line rather than a dot.
    pub line: bool,
}

/// The colour scale drawn beside the plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBarSpec {
    /// Lower bound in colour-scale space.
    pub zmin: f64,
    /// Upper bound in colour-scale space.
    pub zmax: f64,
    /// Whether the scale is logarithmic.
    pub log: bool,
    /// Axis caption.
    pub label: Option<String>,
}

/// Everything needed to draw a figure, in axis space.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Visible axis ranges.
    pub bounds: PlotBounds,
    /// Primitives in draw order.
    pub items: Vec<SceneItem>,
    /// Legend rows in trace order.
    pub legend: Vec<LegendEntry>,
    /// Colour bar of the first heatmap or contour.
    pub color_bar: Option<ColorBarSpec>,
}

/// Maps data coordinates onto axis coordinates and counts what a logarithmic
/// axis had to hide.
struct AxisMap {
    x: Scale,
    y: Scale,
    hidden: usize,
}

impl AxisMap {
    fn map_x(&self, x: f64) -> f64 {
        to_scale_space(x, self.x)
    }

    fn map_y(&self, y: f64) -> f64 {
        to_scale_space(y, self.y)
    }

    fn map(&mut self, (x, y): (f64, f64)) -> (f64, f64) {
        let p = (self.map_x(x), self.map_y(y));
        if (p.0.is_nan() && !x.is_nan()) || (p.1.is_nan() && !y.is_nan()) {
            self.hidden += 1;
        }
        p
    }

    fn map_all(&mut self, points: impl IntoIterator<Item = (f64, f64)>) -> Vec<(f64, f64)> {
        points.into_iter().map(|p| self.map(p)).collect()
    }
}

/// A stroke waiting for the final bounds so its dashes can be cut.
struct Stroke {
    points: Vec<(f64, f64)>,
    linestyle: LineStyle,
    color: Rgb,
    width: f64,
    alpha: f64,
}

enum Pending {
    Stroke(Stroke),
    Item(SceneItem),
}

impl Scene {
    /// Flatten `figure` for an image of `size` pixels.
    pub fn build(figure: &Figure, size: (u32, u32)) -> Self {
        let mut axes = AxisMap {
            x: figure.xscale(),
            y: figure.yscale(),
            hidden: 0,
        };
        let mut pending = Vec::new();
        let mut legend = Vec::new();
        let mut color_bar = None;

        for trace in figure.traces() {
            match trace {
                Trace::Scatter(s) => push_line(&mut pending, &mut axes, s.x(), s.y(), s.line()),
                Trace::Kde(k) => push_line(&mut pending, &mut axes, k.x(), k.y(), k.line()),
                Trace::ErrorBand(band) => push_errorband(&mut pending, &mut axes, band),
                Trace::Histogram(hist) => push_histogram(&mut pending, &mut axes, hist),
                Trace::Heatmap(mesh) => {
                    let norm = mesh.color_norm();
                    push_mesh(&mut pending, &axes, mesh, &norm);
                    if color_bar.is_none() {
                        color_bar = Some(color_bar_for(mesh, &norm));
                    }
                }
                Trace::Contour(contour) => {
                    let norm = contour.mesh().color_norm();
                    push_mesh(&mut pending, &axes, contour.mesh(), &norm);
                    push_isolines(&mut pending, &axes, contour, &norm);
                    if color_bar.is_none() {
                        color_bar = Some(color_bar_for(contour.mesh(), &norm));
                    }
                }
            }
            if let Some(entry) = legend_entry(trace) {
                legend.push(entry);
            }
        }
        if axes.hidden > 0 {
            warn!(
                hidden = axes.hidden,
                "non-positive coordinates cannot be shown on a logarithmic axis and were skipped"
            );
        }

        let all_points = pending.iter().flat_map(|p| match p {
            Pending::Stroke(stroke) => stroke.points.clone(),
            Pending::Item(item) => item.points(),
        });
        let mut bounds = PlotBounds::from_points(all_points)
            .unwrap_or(PlotBounds::new(0.0, 1.0, 0.0, 1.0))
            .with_margin(MARGIN_PERCENT);
        if figure.aspect() == Some(Aspect::Equal) {
            let bar = if color_bar.is_some() { COLOR_BAR_WIDTH } else { 0 };
            let width = size.0.saturating_sub(Y_LABEL_AREA + bar + 20);
            let height = size.1.saturating_sub(X_LABEL_AREA + 60);
            bounds = bounds.equalize_aspect(width, height);
        }

        let mut items = Vec::new();
        for p in pending {
            match p {
                Pending::Item(item) => items.push(item),
                Pending::Stroke(stroke) => {
                    items.extend(dash_pieces(&stroke.points, stroke.linestyle, &bounds).into_iter().map(
                        |points| SceneItem::Line {
                            points,
                            color: stroke.color,
                            width: stroke.width,
                            alpha: stroke.alpha,
                        },
                    ));
                }
            }
        }

        Self {
            bounds,
            items,
            legend,
            color_bar,
        }
    }
}

fn push_line(pending: &mut Vec<Pending>, axes: &mut AxisMap, x: &[f64], y: &[f64], props: &LineProps) {
    let points = axes.map_all(x.iter().copied().zip(y.iter().copied()));
    push_styled(pending, points.clone(), points, props);
}

/// Stroke `line_points` and put markers on `marker_points` as the style says.
fn push_styled(
    pending: &mut Vec<Pending>,
    line_points: Vec<(f64, f64)>,
    marker_points: Vec<(f64, f64)>,
    props: &LineProps,
) {
    let linestyle = match (props.linestyle, props.marker) {
        // a trace must stay visible
        (LineStyle::None, None) => LineStyle::Solid,
        (linestyle, _) => linestyle,
    };
    pending.push(Pending::Stroke(Stroke {
        points: line_points,
        linestyle,
        color: props.color,
        width: props.linewidth,
        alpha: props.alpha,
    }));
    if let Some(marker) = props.marker {
        pending.push(Pending::Item(SceneItem::Markers {
            points: marker_points.into_iter().filter(|p| p.0.is_finite() && p.1.is_finite()).collect(),
            marker,
            color: props.color,
            alpha: props.alpha,
        }));
    }
}

fn push_errorband(pending: &mut Vec<Pending>, axes: &mut AxisMap, band: &ErrorBand) {
    let outline: Vec<(f64, f64)> = axes
        .map_all(band.band_polygon())
        .into_iter()
        .filter(|p| p.0.is_finite() && p.1.is_finite())
        .collect();
    pending.push(Pending::Item(SceneItem::Fill {
        points: outline,
        color: band.line().color,
        alpha: band.band_alpha(),
    }));
    push_line(pending, axes, band.x(), band.y(), band.line());
}

fn push_histogram(pending: &mut Vec<Pending>, axes: &mut AxisMap, hist: &Histogram) {
    let steps = axes.map_all(hist.finite_step_x().into_iter().zip(hist.step_y().iter().copied()));
    let centres = axes.map_all(hist.marker_positions());
    push_styled(pending, steps, centres, hist.line());
}

fn push_mesh(pending: &mut Vec<Pending>, axes: &AxisMap, mesh: &Heatmap, norm: &ColorNorm) {
    let ex: Vec<f64> = mesh.cell_edges_x().into_iter().map(|v| axes.map_x(v)).collect();
    let ey: Vec<f64> = mesh.cell_edges_y().into_iter().map(|v| axes.map_y(v)).collect();
    for ((j, i), &value) in norm.values().indexed_iter() {
        let Some(t) = norm.normalize(value) else {
            continue;
        };
        let corners = [(ex[i], ey[j]), (ex[i + 1], ey[j + 1])];
        if corners.iter().any(|p| !(p.0.is_finite() && p.1.is_finite())) {
            continue;
        }
        pending.push(Pending::Item(SceneItem::Cell {
            corners,
            color: plasma(t),
            alpha: mesh.alpha(),
        }));
    }
}

fn push_isolines(pending: &mut Vec<Pending>, axes: &AxisMap, contour: &Contour, norm: &ColorNorm) {
    let mesh = contour.mesh();
    let xs: Vec<f64> = mesh.x().iter().map(|&v| axes.map_x(v)).collect();
    let ys: Vec<f64> = mesh.y().iter().map(|&v| axes.map_y(v)).collect();
    let finite = |s: &[(f64, f64); 2]| s.iter().all(|p| p.0.is_finite() && p.1.is_finite());
    let black = Rgb { r: 0.0, g: 0.0, b: 0.0 };

    for level in contour.resolved_levels(norm) {
        let segments: Vec<[(f64, f64); 2]> = isoline_segments(&xs, &ys, norm.values(), level)
            .into_iter()
            .filter(finite)
            .collect();
        let longest = segments.iter().max_by(|a, b| seg_len(a).total_cmp(&seg_len(b)));
        if let Some(s) = longest {
            let raw = match mesh.zscale() {
                Scale::Log => 10f64.powf(level),
                Scale::Linear => level,
            };
            pending.push(Pending::Item(SceneItem::Label {
                position: ((s[0].0 + s[1].0) / 2.0, (s[0].1 + s[1].1) / 2.0),
                text: format_level(raw),
            }));
        }
        pending.extend(segments.into_iter().map(|s| {
            Pending::Item(SceneItem::Line {
                points: s.to_vec(),
                color: black,
                width: 1.0,
                alpha: 1.0,
            })
        }));
    }
}

fn seg_len(s: &[(f64, f64); 2]) -> f64 {
    (s[1].0 - s[0].0).hypot(s[1].1 - s[0].1)
}

fn color_bar_for(mesh: &Heatmap, norm: &ColorNorm) -> ColorBarSpec {
    let log = mesh.zscale().is_log();
    ColorBarSpec {
        zmin: norm.zmin(),
        zmax: norm.zmax(),
        log,
        label: mesh.zlabel().map(|l| if log { format!("log10 {l}") } else { l.to_owned() }),
    }
}

fn legend_entry(trace: &Trace) -> Option<LegendEntry> {
    let props = match trace {
        Trace::Scatter(s) => s.line(),
        Trace::Kde(k) => k.line(),
        Trace::ErrorBand(b) => b.line(),
        Trace::Histogram(h) => h.line(),
        Trace::Heatmap(_) | Trace::Contour(_) => return None,
    };
    Some(LegendEntry {
        label: trace.label()?.to_owned(),
        color: props.color,
        line: props.linestyle.is_visible() || props.marker.is_none(),
    })
}

fn plasma(t: f64) -> Rgb {
    let c = colorous::PLASMA.eval_continuous(t);
    Rgb::from_rgb8(c.r, c.g, c.b)
}

/// Cut a polyline into the pieces that are actually inked.
///
/// Runs are broken at non-finite vertices. Dash lengths are measured with
/// both axes scaled to unit length so patterns look alike on any data range.
pub fn dash_pieces(points: &[(f64, f64)], linestyle: LineStyle, bounds: &PlotBounds) -> Vec<Vec<(f64, f64)>> {
    let runs = points
        .split(|p| !(p.0.is_finite() && p.1.is_finite()))
        .filter(|run| run.len() >= 2);
    let (on, off) = match linestyle {
        LineStyle::None => return Vec::new(),
        LineStyle::Solid => return runs.map(<[_]>::to_vec).collect(),
        LineStyle::Dashed => DASH_PATTERN,
        LineStyle::Dotted => DOT_PATTERN,
    };

    let sx = (bounds.x_max - bounds.x_min).abs().max(f64::MIN_POSITIVE);
    let sy = (bounds.y_max - bounds.y_min).abs().max(f64::MIN_POSITIVE);
    let mut pieces = Vec::new();
    for run in runs {
        let mut inked = true;
        let mut left = on;
        let mut piece = vec![run[0]];
        for w in run.windows(2) {
            let (a, b) = (w[0], w[1]);
            let length = ((b.0 - a.0) / sx).hypot((b.1 - a.1) / sy);
            let mut travelled = 0.0;
            while length - travelled > 1e-12 {
                let step = left.min(length - travelled);
                travelled += step;
                left -= step;
                let f = travelled / length;
                let p = (a.0 + (b.0 - a.0) * f, a.1 + (b.1 - a.1) * f);
                if inked {
                    piece.push(p);
                }
                if left <= 1e-12 {
                    inked = !inked;
                    left = if inked { on } else { off };
                    if inked {
                        piece = vec![p];
                    } else if piece.len() >= 2 {
                        pieces.push(std::mem::take(&mut piece));
                    }
                }
            }
        }
        if inked && piece.len() >= 2 {
            pieces.push(piece);
        }
    }
    pieces
}

/// Tick label for a `log10` axis coordinate.
pub fn format_log_tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("1e{}", v.round() as i64)
    } else {
        format_level(10f64.powf(v))
    }
}

fn format_level(v: f64) -> String {
    let text = format!("{v:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" { "0".to_owned() } else { text.to_owned() }
}

fn rgba(color: Rgb, alpha: f64) -> RGBAColor {
    let (r, g, b) = color.to_rgb8();
    RGBColor(r, g, b).mix(alpha)
}

/// A figure flattened for plotters, drawable onto any plotters backend.
#[derive(Debug, Clone)]
pub struct PlottersPlotter {
    scene: Scene,
    title: Option<String>,
    displayed_title: Option<String>,
    subtitle: Option<String>,
    xlabel: Option<String>,
    ylabel: Option<String>,
    x_log: bool,
    y_log: bool,
    options: PlottersOptions,
}

impl PlottersPlotter {
    /// Flatten `figure` with default options.
    pub fn new(figure: &Figure) -> PlotResult<Self> {
        Self::with_options(figure, PlottersOptions::default())
    }

    /// Flatten `figure`.
    pub fn with_options(figure: &Figure, options: PlottersOptions) -> PlotResult<Self> {
        let (width, height) = options.size;
        if width == 0 || height == 0 {
            return Err(PlotError::invalid_value(
                "size",
                format!("image size must be positive, got {width}x{height}"),
            ));
        }
        let scene = Scene::build(figure, options.size);
        debug!(
            traces = figure.traces().len(),
            items = scene.items.len(),
            "plotters scene built"
        );
        Ok(Self {
            scene,
            title: figure.title().map(str::to_owned),
            displayed_title: figure.displayed_title().map(str::to_owned),
            subtitle: figure.subtitle().map(str::to_owned),
            xlabel: figure.xlabel().map(str::to_owned),
            ylabel: figure.ylabel().map(str::to_owned),
            x_log: figure.xscale().is_log(),
            y_log: figure.yscale().is_log(),
            options,
        })
    }

    /// Boxed constructor matching [`BackendFactory`](super::BackendFactory).
    pub fn factory(figure: &Figure) -> PlotResult<Box<dyn Plotter>> {
        Ok(Box::new(Self::new(figure)?))
    }

    /// The flattened figure.
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Output settings.
    pub const fn options(&self) -> PlottersOptions {
        self.options
    }

    /// Draw onto `root`, which is filled white first.
    pub fn render_on<DB: DrawingBackend>(
        &self,
        root: DrawingArea<DB, Shift>,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;
        let area = match &self.displayed_title {
            Some(title) => root.titled(title, (FONT, 24))?,
            None => root.clone(),
        };
        let (plot_area, bar_area) = match &self.scene.color_bar {
            Some(_) => {
                let (w, _) = area.dim_in_pixel();
                let (plot, bar) = area.split_horizontally(w.saturating_sub(COLOR_BAR_WIDTH));
                (plot, Some(bar))
            }
            None => (area, None),
        };

        let b = &self.scene.bounds;
        let mut builder = ChartBuilder::on(&plot_area);
        builder
            .margin(10)
            .x_label_area_size(X_LABEL_AREA)
            .y_label_area_size(Y_LABEL_AREA);
        if let Some(subtitle) = &self.subtitle {
            builder.caption(subtitle.replace('\n', "  "), (FONT, 16));
        }
        let mut chart = builder.build_cartesian_2d(b.x_min..b.x_max, b.y_min..b.y_max)?;

        let log_formatter = |v: &f64| format_log_tick(*v);
        let mut mesh = chart.configure_mesh();
        if let Some(label) = &self.xlabel {
            mesh.x_desc(label);
        }
        if let Some(label) = &self.ylabel {
            mesh.y_desc(label);
        }
        if self.x_log {
            mesh.x_label_formatter(&log_formatter);
        }
        if self.y_log {
            mesh.y_label_formatter(&log_formatter);
        }
        mesh.draw()?;

        for item in &self.scene.items {
            draw_item(&mut chart, item)?;
        }

        if !self.scene.legend.is_empty() {
            for entry in &self.scene.legend {
                let color = rgba(entry.color, 1.0);
                let line = entry.line;
                chart
                    .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
                    .label(entry.label.as_str())
                    .legend(move |(x, y)| {
                        if line {
                            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                        } else {
                            PathElement::new(vec![(x + 8, y - 2), (x + 12, y + 2)], color.stroke_width(4))
                        }
                    });
            }
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }

        if let (Some(bar), Some(spec)) = (bar_area, &self.scene.color_bar) {
            draw_color_bar(&bar, spec)?;
        }

        root.present()
    }

    fn render_to(&self, path: &Path, format: ImageFormat) -> PlotResult<()> {
        let size = self.options.size;
        match format {
            ImageFormat::Svg => self
                .render_on(SVGBackend::new(path, size).into_drawing_area())
                .map_err(|e| PlotError::render(BACKEND_NAME, e.to_string())),
            ImageFormat::Png | ImageFormat::Bmp | ImageFormat::Jpeg => self
                .render_on(BitMapBackend::new(path, size).into_drawing_area())
                .map_err(|e| PlotError::render(BACKEND_NAME, e.to_string())),
        }
    }

    /// The path and format a save request resolves to.
    fn output_path(&self, file_name: Option<&Path>) -> PlotResult<(PathBuf, ImageFormat)> {
        let path = resolve_file_name(file_name, self.title())?;
        let Some(extension) = path.extension() else {
            let format = self.options.format;
            return Ok((ensure_extension(path, format.extension()), format));
        };
        let extension = extension.to_string_lossy();
        match ImageFormat::from_extension(&extension) {
            Some(format) => Ok((path, format)),
            None => Err(PlotError::unsupported(
                BACKEND_NAME,
                format!("saving to .{extension} files"),
            )),
        }
    }
}

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn draw_item<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    item: &SceneItem,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    match item {
        SceneItem::Line {
            points,
            color,
            width,
            alpha,
        } => {
            let style = rgba(*color, *alpha).stroke_width(width.round().max(1.0) as u32);
            chart.draw_series(std::iter::once(PathElement::new(points.clone(), style)))?;
        }
        SceneItem::Markers {
            points,
            marker,
            color,
            alpha,
        } => draw_markers(chart, points, *marker, rgba(*color, *alpha))?,
        SceneItem::Fill { points, color, alpha } => {
            chart.draw_series(std::iter::once(Polygon::new(
                points.clone(),
                rgba(*color, *alpha).filled(),
            )))?;
        }
        SceneItem::Cell {
            corners,
            color,
            alpha,
        } => {
            chart.draw_series(std::iter::once(Rectangle::new(*corners, rgba(*color, *alpha).filled())))?;
        }
        SceneItem::Label { position, text } => {
            chart.draw_series(std::iter::once(Text::new(
                text.clone(),
                *position,
                (FONT, 12).into_font().color(&BLACK),
            )))?;
        }
    }
    Ok(())
}

fn draw_markers<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    points: &[(f64, f64)],
    marker: Marker,
    color: RGBAColor,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let stroke = color.stroke_width(1);
    let r = 4;
    match marker {
        Marker::Point => {
            chart.draw_series(points.iter().map(|&p| Circle::new(p, 2, color.filled())))?;
        }
        Marker::Circle => {
            chart.draw_series(points.iter().map(|&p| Circle::new(p, r, stroke)))?;
        }
        Marker::Cross => {
            chart.draw_series(points.iter().map(|&p| Cross::new(p, r, stroke)))?;
        }
        Marker::Plus => {
            chart.draw_series(points.iter().map(|&p| {
                EmptyElement::at(p)
                    + PathElement::new(vec![(-r, 0), (r, 0)], stroke)
                    + PathElement::new(vec![(0, -r), (0, r)], stroke)
            }))?;
        }
        Marker::Star => {
            chart.draw_series(points.iter().map(|&p| {
                EmptyElement::at(p)
                    + PathElement::new(vec![(-r, 0), (r, 0)], stroke)
                    + PathElement::new(vec![(0, -r), (0, r)], stroke)
                    + PathElement::new(vec![(-3, -3), (3, 3)], stroke)
                    + PathElement::new(vec![(-3, 3), (3, -3)], stroke)
            }))?;
        }
    }
    Ok(())
}

fn draw_color_bar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    spec: &ColorBarSpec,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (lo, hi) = if spec.zmax > spec.zmin {
        (spec.zmin, spec.zmax)
    } else {
        (spec.zmin - 0.5, spec.zmin + 0.5)
    };
    let mut bar = ChartBuilder::on(area)
        .margin_top(40)
        .margin_bottom(X_LABEL_AREA + 10)
        .margin_right(10)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(0f64..1f64, lo..hi)?;

    let log_formatter = |v: &f64| format_log_tick(*v);
    let mut mesh = bar.configure_mesh();
    mesh.disable_mesh().disable_x_axis().y_labels(6);
    if let Some(label) = &spec.label {
        mesh.y_desc(label);
    }
    if spec.log {
        mesh.y_label_formatter(&log_formatter);
    }
    mesh.draw()?;

    let step = (hi - lo) / COLOR_BAR_STEPS as f64;
    bar.draw_series((0..COLOR_BAR_STEPS).map(|k| {
        let z0 = lo + step * k as f64;
        let t = (k as f64 + 0.5) / COLOR_BAR_STEPS as f64;
        Rectangle::new([(0.0, z0), (1.0, z0 + step)], rgba(plasma(t), 1.0).filled())
    }))?;
    Ok(())
}

fn open_in_viewer(path: &Path) -> PlotResult<()> {
    #[cfg(target_os = "macos")]
    let mut command = Command::new("open");
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = Command::new("xdg-open");

    command.arg(path).spawn()?;
    Ok(())
}

impl Plotter for PlottersPlotter {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Writes an SVG into the temporary directory and opens it with the
    /// platform viewer.
    fn show(&self) -> PlotResult<()> {
        let stem = sanitize_file_stem(self.title().unwrap_or("figure"));
        let n = SHOW_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("{stem}_{}_{n}.svg", std::process::id()));
        self.render_to(&path, ImageFormat::Svg)?;
        debug!(path = %path.display(), "opening plot");
        open_in_viewer(&path)
    }

    fn save(&self, file_name: Option<&Path>) -> PlotResult<PathBuf> {
        let (path, format) = self.output_path(file_name)?;
        self.render_to(&path, format)?;
        info!(path = %path.display(), ?format, "plot saved");
        Ok(path)
    }
}
