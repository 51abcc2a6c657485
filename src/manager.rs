//! Registry of backends and the figures drawn with them.
//!
//! A [`Manager`] is an explicit context object: create one, make figures
//! through it, then draw, show or save all of them at once.
//!
//! ```no_run
//! use serde_json::json;
//! use unified_plot::{Manager, SaveLocation, TraceStyle};
//!
//! let mut manager = Manager::new();
//! manager
//!     .new_figure([("title", json!("Squares")), ("xlabel", json!("n"))])?
//!     .scatter([0, 1, 2], [0, 1, 4], TraceStyle::new())?;
//! manager.draw(None)?;
//! let written = manager.save(&SaveLocation::WorkingDir)?;
//! # Ok::<(), unified_plot::PlotError>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::backends::{BackendFactory, Plotter, sanitize_file_stem};
use crate::error::{PlotError, PlotResult};
use crate::figure::Figure;

/// Property name reserved by [`Manager::new_figure`] for choosing a backend.
pub const BACKEND_PROPERTY: &str = "backend";

#[cfg(feature = "plotly-backend")]
const DEFAULT_BACKEND: &str = crate::backends::plotly::BACKEND_NAME;
#[cfg(all(not(feature = "plotly-backend"), feature = "plotters-backend"))]
const DEFAULT_BACKEND: &str = crate::backends::plotters::BACKEND_NAME;
#[cfg(not(any(feature = "plotly-backend", feature = "plotters-backend")))]
const DEFAULT_BACKEND: &str = "plotly";

/// Where [`Manager::save`] writes its files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveLocation {
    /// The current working directory.
    #[default]
    WorkingDir,
    /// `<executable name>_plots/` in the working directory, created if needed.
    ScriptDir,
    /// This directory, created if needed.
    Dir(PathBuf),
}

impl SaveLocation {
    /// Resolve to a directory, creating it when required.
    fn prepare(&self) -> PlotResult<PathBuf> {
        let dir = match self {
            SaveLocation::WorkingDir => return Ok(PathBuf::new()),
            SaveLocation::ScriptDir => {
                let exe = std::env::current_exe()?;
                let stem = exe.file_stem().ok_or_else(|| {
                    PlotError::missing("executable name", "use SaveLocation::Dir instead")
                })?;
                PathBuf::from(format!("{}_plots", stem.to_string_lossy()))
            }
            SaveLocation::Dir(dir) => dir.clone(),
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

struct ManagedFigure {
    figure: Figure,
    backend: Option<String>,
}

/// Figures, the backends that can draw them, and the plots drawn so far.
pub struct Manager {
    backends: BTreeMap<String, BackendFactory>,
    default_backend: String,
    figures: Vec<ManagedFigure>,
    drawn: BTreeMap<usize, Box<dyn Plotter>>,
    saved: BTreeSet<usize>,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    /// A manager with the compiled-in backends registered.
    pub fn new() -> Self {
        let mut manager = Self {
            backends: BTreeMap::new(),
            default_backend: DEFAULT_BACKEND.to_owned(),
            figures: Vec::new(),
            drawn: BTreeMap::new(),
            saved: BTreeSet::new(),
        };
        #[cfg(feature = "plotly-backend")]
        manager.register_backend(
            crate::backends::plotly::BACKEND_NAME,
            Box::new(crate::backends::plotly::PlotlyPlotter::factory),
        );
        #[cfg(feature = "plotters-backend")]
        manager.register_backend(
            crate::backends::plotters::BACKEND_NAME,
            Box::new(crate::backends::plotters::PlottersPlotter::factory),
        );
        manager
    }

    /// Register `factory` under `name`, replacing any backend of that name.
    pub fn register_backend(&mut self, name: impl Into<String>, factory: BackendFactory) -> &mut Self {
        let name = name.into();
        debug!(backend = %name, "backend registered");
        self.backends.insert(name, factory);
        self
    }

    /// Registered backend names, sorted.
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    /// Name of the backend used when none is requested.
    pub fn default_backend(&self) -> &str {
        &self.default_backend
    }

    /// Make `name` the default backend.
    ///
    /// # Errors
    ///
    /// [`PlotError::Value`] if no backend of that name is registered.
    pub fn set_default_backend(&mut self, name: &str) -> PlotResult<()> {
        self.check_backend(name)?;
        self.default_backend = name.to_owned();
        Ok(())
    }

    fn check_backend(&self, name: &str) -> PlotResult<()> {
        if self.backends.contains_key(name) {
            Ok(())
        } else {
            Err(PlotError::invalid_value(
                BACKEND_PROPERTY,
                format!("'{name}' is not registered; expected one of {:?}", self.backend_names()),
            ))
        }
    }

    /// Create a figure from loosely typed properties and keep it.
    ///
    /// The reserved property `backend` pins the figure to a registered
    /// backend; every other property goes through [`Figure::set`]. Nothing is
    /// stored unless every property is valid.
    pub fn new_figure<I, K>(&mut self, properties: I) -> PlotResult<&mut Figure>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut backend = None;
        let mut rest = Vec::new();
        for (name, value) in properties {
            if name.as_ref() != BACKEND_PROPERTY {
                rest.push((name, value));
                continue;
            }
            match value {
                Value::String(name) => {
                    self.check_backend(&name)?;
                    backend = Some(name);
                }
                Value::Null => backend = None,
                other => {
                    return Err(PlotError::invalid_type(
                        BACKEND_PROPERTY,
                        "string",
                        other.to_string(),
                    ));
                }
            }
        }

        let mut figure = Figure::new();
        figure.set(rest)?;
        Ok(self.push(figure, backend))
    }

    /// Keep an already built figure, drawn with the default backend.
    pub fn add_figure(&mut self, figure: Figure) -> &mut Figure {
        self.push(figure, None)
    }

    fn push(&mut self, figure: Figure, backend: Option<String>) -> &mut Figure {
        let index = self.figures.len();
        debug!(index, backend = backend.as_deref().unwrap_or("default"), "figure created");
        self.figures.push(ManagedFigure { figure, backend });
        &mut self.figures[index].figure
    }

    /// Number of figures.
    pub fn len(&self) -> usize {
        self.figures.len()
    }

    /// Whether no figure was created yet.
    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    /// Figures in creation order.
    pub fn figures(&self) -> impl Iterator<Item = &Figure> {
        self.figures.iter().map(|f| &f.figure)
    }

    /// The figure at `index` (creation order).
    pub fn figure_mut(&mut self, index: usize) -> Option<&mut Figure> {
        self.figures.get_mut(index).map(|f| &mut f.figure)
    }

    /// Plots drawn so far, in figure order.
    pub fn plots(&self) -> impl Iterator<Item = &dyn Plotter> {
        self.drawn.values().map(|p| p.as_ref())
    }

    fn build(&self, index: usize, backend: Option<&str>) -> PlotResult<Box<dyn Plotter>> {
        let managed = &self.figures[index];
        let name = backend
            .or(managed.backend.as_deref())
            .unwrap_or(&self.default_backend);
        let factory = self.backends.get(name).ok_or_else(|| {
            PlotError::invalid_value(
                BACKEND_PROPERTY,
                format!("'{name}' is not registered; expected one of {:?}", self.backend_names()),
            )
        })?;
        factory(&managed.figure)
    }

    /// Render every figure, replacing earlier drawings.
    ///
    /// `backend` overrides both the per-figure and the default backend. If
    /// any figure fails to render, the previous drawings are kept.
    pub fn draw(&mut self, backend: Option<&str>) -> PlotResult<()> {
        if let Some(name) = backend {
            self.check_backend(name)?;
        }
        let drawn = (0..self.figures.len())
            .map(|index| Ok((index, self.build(index, backend)?)))
            .collect::<PlotResult<BTreeMap<_, _>>>()?;
        info!(figures = drawn.len(), backend = backend.unwrap_or("per figure"), "figures drawn");
        self.drawn = drawn;
        self.saved.clear();
        Ok(())
    }

    /// Draw the figures that have no plot yet with their own backend.
    fn draw_missing(&mut self) -> PlotResult<()> {
        for index in 0..self.figures.len() {
            if !self.drawn.contains_key(&index) {
                let plot = self.build(index, None)?;
                self.drawn.insert(index, plot);
            }
        }
        Ok(())
    }

    /// Show every plot, drawing undrawn figures first.
    pub fn show(&mut self) -> PlotResult<()> {
        self.draw_missing()?;
        for plot in self.drawn.values() {
            plot.show()?;
        }
        Ok(())
    }

    /// Save every plot into `location`, drawing undrawn figures first.
    ///
    /// Files are named after the figure title, or `figure_<n>` (counting from
    /// one in creation order) for untitled figures. Returns the paths written.
    pub fn save(&mut self, location: &SaveLocation) -> PlotResult<Vec<PathBuf>> {
        self.save_where(location, |_| true)
    }

    /// Like [`Manager::save`], but skip figures that were saved before.
    pub fn save_unsaved(&mut self, location: &SaveLocation) -> PlotResult<Vec<PathBuf>> {
        let saved = self.saved.clone();
        self.save_where(location, |index| !saved.contains(&index))
    }

    fn save_where(&mut self, location: &SaveLocation, wanted: impl Fn(usize) -> bool) -> PlotResult<Vec<PathBuf>> {
        self.draw_missing()?;
        let dir = location.prepare()?;
        let mut written = Vec::new();
        for (&index, plot) in &self.drawn {
            if !wanted(index) {
                continue;
            }
            let name = file_name(&dir, plot.title(), index);
            let path = plot.save(Some(name.as_path()))?;
            self.saved.insert(index);
            written.push(path);
        }
        info!(files = written.len(), dir = %dir.display(), "figures saved");
        Ok(written)
    }
}

fn file_name(dir: &Path, title: Option<&str>, index: usize) -> PathBuf {
    let stem = match title {
        Some(title) => sanitize_file_stem(title),
        None => format!("figure_{}", index + 1),
    };
    dir.join(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{ensure_extension, resolve_file_name};
    use crate::error::ErrorKind;
    use crate::style::TraceStyle;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording {
        title: Option<String>,
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Plotter for Recording {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        fn title(&self) -> Option<&str> {
            self.title.as_deref()
        }

        fn show(&self) -> PlotResult<()> {
            self.log
                .borrow_mut()
                .push(format!("{} show {}", self.name, self.title().unwrap_or("-")));
            Ok(())
        }

        fn save(&self, file_name: Option<&Path>) -> PlotResult<PathBuf> {
            let path = ensure_extension(resolve_file_name(file_name, self.title())?, "txt");
            std::fs::write(&path, self.name)?;
            Ok(path)
        }
    }

    fn recording(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> BackendFactory {
        let log = Rc::clone(log);
        Box::new(move |figure: &Figure| {
            Ok(Box::new(Recording {
                title: figure.title().map(str::to_owned),
                name,
                log: Rc::clone(&log),
            }) as Box<dyn Plotter>)
        })
    }

    fn manager_with_recorders() -> (Manager, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = Manager::new();
        manager.register_backend("a", recording("a", &log));
        manager.register_backend("b", recording("b", &log));
        manager.set_default_backend("a").unwrap();
        (manager, log)
    }

    #[test]
    fn test_builtin_backends() {
        let manager = Manager::new();
        assert_eq!(manager.backend_names(), vec!["plotly", "plotters"]);
        assert_eq!(manager.default_backend(), "plotly");
        assert!(manager.is_empty());
    }

    #[test]
    fn test_set_default_backend() {
        let mut manager = Manager::new();
        let err = manager.set_default_backend("matplotlib").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
        assert_eq!(manager.default_backend(), "plotly");
        manager.set_default_backend("plotters").unwrap();
        assert_eq!(manager.default_backend(), "plotters");
    }

    #[test]
    fn test_new_figure_properties() {
        let mut manager = Manager::new();
        let fig = manager
            .new_figure([("title", json!("T")), ("xscale", json!("log"))])
            .unwrap();
        assert_eq!(fig.title(), Some("T"));
        assert!(fig.xscale().is_log());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_invalid_figure_is_not_stored() {
        let mut manager = Manager::new();
        let err = manager
            .new_figure([("title", json!("T")), ("colour", json!("red"))])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);

        let err = manager.new_figure([("backend", json!("nope"))]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);

        let err = manager.new_figure([("backend", json!(3))]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_draw_picks_backend() {
        let (mut manager, log) = manager_with_recorders();
        manager.new_figure([("title", json!("one"))]).unwrap();
        manager
            .new_figure([("title", json!("two")), ("backend", json!("b"))])
            .unwrap();

        manager.draw(None).unwrap();
        let names: Vec<&str> = manager.plots().map(|p| p.backend_name()).collect();
        assert_eq!(names, vec!["a", "b"]);

        manager.draw(Some("b")).unwrap();
        let names: Vec<&str> = manager.plots().map(|p| p.backend_name()).collect();
        assert_eq!(names, vec!["b", "b"]);

        manager.show().unwrap();
        assert_eq!(*log.borrow(), vec!["b show one", "b show two"]);

        let err = manager.draw(Some("c")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_show_draws_first() {
        let (mut manager, log) = manager_with_recorders();
        manager.new_figure(Vec::<(&str, Value)>::new()).unwrap();
        manager.show().unwrap();
        assert_eq!(*log.borrow(), vec!["a show -"]);
    }

    #[test]
    fn test_save_names_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("plots");
        let (mut manager, _) = manager_with_recorders();
        manager.new_figure([("title", json!("a/b"))]).unwrap();
        manager.new_figure(Vec::<(&str, Value)>::new()).unwrap();

        let written = manager.save(&SaveLocation::Dir(target.clone())).unwrap();
        assert_eq!(
            written,
            vec![target.join("a_b.txt"), target.join("figure_2.txt")]
        );
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_save_unsaved() {
        let dir = tempfile::tempdir().unwrap();
        let location = SaveLocation::Dir(dir.path().to_path_buf());
        let (mut manager, _) = manager_with_recorders();
        manager.new_figure([("title", json!("first"))]).unwrap();
        assert_eq!(manager.save_unsaved(&location).unwrap().len(), 1);

        manager.new_figure([("title", json!("second"))]).unwrap();
        let written = manager.save_unsaved(&location).unwrap();
        assert_eq!(written, vec![dir.path().join("second.txt")]);
        assert!(manager.save_unsaved(&location).unwrap().is_empty());
        assert_eq!(manager.save(&location).unwrap().len(), 2);

        manager.draw(None).unwrap();
        assert_eq!(manager.save_unsaved(&location).unwrap().len(), 2);
    }

    #[test]
    fn test_plotly_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = Manager::new();
        manager
            .new_figure([("title", json!("squares"))])
            .unwrap()
            .scatter([0, 1, 2], [0, 1, 4], TraceStyle::new())
            .unwrap();
        manager.draw(None).unwrap();
        let written = manager
            .save(&SaveLocation::Dir(dir.path().to_path_buf()))
            .unwrap();
        assert_eq!(written, vec![dir.path().join("squares.html")]);
    }
}
