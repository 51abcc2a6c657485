//! Colour-mapped grids: heatmaps and contour plots.

use ndarray::Array2;
use num_traits::ToPrimitive;

use crate::colornorm::{ColorNorm, to_scale_space};
use crate::error::{PlotError, PlotResult};
use crate::style::Scale;
use crate::validation::{check_alpha, to_f64_vec};

/// Colour-scale settings shared by [`Heatmap`] and [`Contour`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMeshOptions {
    /// Linear or logarithmic colour scale.
    pub zscale: Scale,
    /// Explicit colour bounds in raw z units.
    pub zlim: Option<(f64, f64)>,
    /// Colour-bar title.
    pub zlabel: Option<String>,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
    /// Legend label.
    pub label: Option<String>,
}

impl Default for ColorMeshOptions {
    fn default() -> Self {
        Self {
            zscale: Scale::Linear,
            zlim: None,
            zlabel: None,
            alpha: 1.0,
            label: None,
        }
    }
}

impl ColorMeshOptions {
    /// Linear scale, data bounds, opaque.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the colour scale.
    pub const fn with_zscale(mut self, zscale: Scale) -> Self {
        self.zscale = zscale;
        self
    }

    /// Set explicit colour bounds.
    pub const fn with_zlim(mut self, zmin: f64, zmax: f64) -> Self {
        self.zlim = Some((zmin, zmax));
        self
    }

    /// Set the colour-bar title.
    pub fn with_zlabel(mut self, zlabel: impl Into<String>) -> Self {
        self.zlabel = Some(zlabel.into());
        self
    }

    /// Set the opacity.
    pub const fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the legend label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn check(&self) -> PlotResult<()> {
        check_alpha(self.alpha)?;
        if let Some((lo, hi)) = self.zlim {
            if !(lo.is_finite() && hi.is_finite()) {
                return Err(PlotError::invalid_value(
                    "zlim",
                    format!("bounds must be finite, got ({lo}, {hi})"),
                ));
            }
            if lo >= hi {
                return Err(PlotError::invalid_value(
                    "zlim",
                    format!("lower bound {lo} must be below upper bound {hi}"),
                ));
            }
            if self.zscale.is_log() && lo <= 0.0 {
                return Err(PlotError::invalid_value(
                    "zlim",
                    format!("bounds must be positive on a logarithmic scale, got {lo}"),
                ));
            }
        }
        Ok(())
    }
}

/// A colour-mapped grid of values `z[j][i]` at coordinates `(x[i], y[j])`.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Array2<f64>,
    options: ColorMeshOptions,
}

impl Heatmap {
    /// Build a heatmap. `z` must have shape `(y.len(), x.len())`.
    pub fn new<X, Y, TX, TY>(x: X, y: Y, z: Array2<f64>, options: ColorMeshOptions) -> PlotResult<Self>
    where
        X: IntoIterator<Item = TX>,
        Y: IntoIterator<Item = TY>,
        TX: ToPrimitive,
        TY: ToPrimitive,
    {
        let x = to_f64_vec("x", x)?;
        let y = to_f64_vec("y", y)?;
        if z.dim() != (y.len(), x.len()) {
            return Err(PlotError::invalid_value(
                "z",
                format!(
                    "shape {:?} does not match (len(y), len(x)) = ({}, {})",
                    z.dim(),
                    y.len(),
                    x.len()
                ),
            ));
        }
        options.check()?;
        Ok(Self { x, y, z, options })
    }

    /// Build a heatmap from row-major nested vectors, one row per `y`.
    pub fn from_rows<X, Y, TX, TY>(
        x: X,
        y: Y,
        rows: Vec<Vec<f64>>,
        options: ColorMeshOptions,
    ) -> PlotResult<Self>
    where
        X: IntoIterator<Item = TX>,
        Y: IntoIterator<Item = TY>,
        TX: ToPrimitive,
        TY: ToPrimitive,
    {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(PlotError::invalid_value("z", "rows have different lengths"));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let z = Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| PlotError::invalid_value("z", e.to_string()))?;
        Self::new(x, y, z, options)
    }

    /// Column coordinates.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Row coordinates.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Values, shape `(ny, nx)`.
    pub const fn z(&self) -> &Array2<f64> {
        &self.z
    }

    /// Colour-scale settings.
    pub const fn options(&self) -> &ColorMeshOptions {
        &self.options
    }

    /// Colour scale.
    pub const fn zscale(&self) -> Scale {
        self.options.zscale
    }

    /// Colour-bar title.
    pub fn zlabel(&self) -> Option<&str> {
        self.options.zlabel.as_deref()
    }

    /// Opacity.
    pub const fn alpha(&self) -> f64 {
        self.options.alpha
    }

    /// Legend label.
    pub fn label(&self) -> Option<&str> {
        self.options.label.as_deref()
    }

    /// Transform the grid into colour-scale space. Call once per draw: the
    /// logarithmic-scale warning is emitted here.
    pub fn color_norm(&self) -> ColorNorm {
        ColorNorm::new(&self.z, self.options.zscale, self.options.zlim)
    }

    /// Cell boundaries along x: midpoints between centres, extended by half a
    /// step at both ends.
    pub fn cell_edges_x(&self) -> Vec<f64> {
        cell_edges(&self.x)
    }

    /// Cell boundaries along y.
    pub fn cell_edges_y(&self) -> Vec<f64> {
        cell_edges(&self.y)
    }
}

fn cell_edges(centers: &[f64]) -> Vec<f64> {
    match centers {
        [] => Vec::new(),
        [only] => vec![only - 0.5, only + 0.5],
        _ => {
            let n = centers.len();
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(centers[0] - (centers[1] - centers[0]) / 2.0);
            edges.extend(centers.windows(2).map(|w| (w[0] + w[1]) / 2.0));
            edges.push(centers[n - 1] + (centers[n - 1] - centers[n - 2]) / 2.0);
            edges
        }
    }
}

/// Which iso-values a [`Contour`] draws.
#[derive(Debug, Clone, PartialEq)]
pub enum ContourLevels {
    /// This many levels evenly spaced strictly inside the colour bounds.
    Count(usize),
    /// Explicit levels in raw z units.
    Values(Vec<f64>),
}

impl Default for ContourLevels {
    fn default() -> Self {
        ContourLevels::Count(5)
    }
}

/// Settings for [`Contour`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContourOptions {
    /// Colour-scale settings of the underlying mesh.
    pub mesh: ColorMeshOptions,
    /// Iso-values to draw.
    pub levels: ContourLevels,
}

impl ContourOptions {
    /// Five levels over a linear, opaque mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mesh options.
    pub fn with_mesh(mut self, mesh: ColorMeshOptions) -> Self {
        self.mesh = mesh;
        self
    }

    /// Set the levels.
    pub fn with_levels(mut self, levels: ContourLevels) -> Self {
        self.levels = levels;
        self
    }
}

impl From<ColorMeshOptions> for ContourOptions {
    fn from(mesh: ColorMeshOptions) -> Self {
        Self {
            mesh,
            levels: ContourLevels::default(),
        }
    }
}

/// A colour-mapped grid with iso-value lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    mesh: Heatmap,
    levels: ContourLevels,
}

impl Contour {
    /// Build a contour plot. `z` must have shape `(y.len(), x.len())`.
    pub fn new<X, Y, TX, TY>(x: X, y: Y, z: Array2<f64>, options: ContourOptions) -> PlotResult<Self>
    where
        X: IntoIterator<Item = TX>,
        Y: IntoIterator<Item = TY>,
        TX: ToPrimitive,
        TY: ToPrimitive,
    {
        let levels = match options.levels {
            ContourLevels::Count(0) => {
                return Err(PlotError::invalid_value("contours", "level count must be positive"));
            }
            ContourLevels::Values(values) => {
                if values.is_empty() {
                    return Err(PlotError::invalid_value("contours", "no levels given"));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(PlotError::invalid_value("contours", "levels must be finite"));
                }
                let mut values = values;
                values.sort_by(f64::total_cmp);
                values.dedup();
                ContourLevels::Values(values)
            }
            count => count,
        };
        let mesh = Heatmap::new(x, y, z, options.mesh)?;
        Ok(Self { mesh, levels })
    }

    /// The underlying colour mesh.
    pub const fn mesh(&self) -> &Heatmap {
        &self.mesh
    }

    /// Requested levels.
    pub const fn levels(&self) -> &ContourLevels {
        &self.levels
    }

    /// Legend label.
    pub fn label(&self) -> Option<&str> {
        self.mesh.label()
    }

    /// Levels resolved in colour-scale space against `norm`.
    ///
    /// Explicit levels are transformed like the data; non-positive levels
    /// vanish under a logarithmic scale.
    pub fn resolved_levels(&self, norm: &ColorNorm) -> Vec<f64> {
        match &self.levels {
            ContourLevels::Count(n) => {
                let (lo, hi) = (norm.zmin(), norm.zmax());
                let step = (hi - lo) / (*n as f64 + 1.0);
                (1..=*n).map(|i| lo + step * i as f64).collect()
            }
            ContourLevels::Values(values) => values
                .iter()
                .map(|&v| to_scale_space(v, norm.scale()))
                .filter(|v| !v.is_nan())
                .collect(),
        }
    }
}
