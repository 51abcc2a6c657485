//! Rendering backends.
//!
//! A backend turns a [`Figure`] into a native plot of some drawing library.
//! Construction takes a snapshot: a [`Plotter`] never sees later changes to
//! the figure it was built from.
//!
//! | Backend    | Library  | Output                             | Feature            |
//! |------------|----------|------------------------------------|--------------------|
//! | `plotly`   | plotly   | Interactive HTML                   | `plotly-backend`   |
//! | `plotters` | plotters | PNG, BMP, JPEG or SVG images       | `plotters-backend` |

#[cfg(feature = "plotly-backend")]
pub mod plotly;
#[cfg(feature = "plotters-backend")]
pub mod plotters;

use std::path::{Path, PathBuf};

use crate::error::{PlotError, PlotResult};
use crate::figure::Figure;

/// A figure rendered by a concrete drawing library.
pub trait Plotter {
    /// Registry name of the backend that produced this plot.
    fn backend_name(&self) -> &'static str;

    /// Title of the figure this plot was drawn from, used for default file names.
    fn title(&self) -> Option<&str>;

    /// Display the plot interactively.
    fn show(&self) -> PlotResult<()>;

    /// Write the plot to disk and return the path actually written.
    ///
    /// Without `file_name` the figure title is used. The backend appends its
    /// default extension when the name has none.
    fn save(&self, file_name: Option<&Path>) -> PlotResult<PathBuf>;
}

/// Builds a [`Plotter`] for a figure; registered by name in the
/// [`Manager`](crate::Manager).
pub type BackendFactory = Box<dyn Fn(&Figure) -> PlotResult<Box<dyn Plotter>>>;

/// Pick the output name: the explicit one, else the title.
pub(crate) fn resolve_file_name(file_name: Option<&Path>, title: Option<&str>) -> PlotResult<PathBuf> {
    match (file_name, title) {
        (Some(name), _) => Ok(name.to_path_buf()),
        (None, Some(title)) => Ok(PathBuf::from(sanitize_file_stem(title))),
        (None, None) => Err(PlotError::missing(
            "file name",
            "pass a file name or give the figure a title",
        )),
    }
}

/// Replace characters that would turn a title into a nested or invalid path.
pub(crate) fn sanitize_file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\n' | '\r' => '_',
            c => c,
        })
        .collect()
}

/// Append `.{extension}` unless the path already ends with it.
pub(crate) fn ensure_extension(path: PathBuf, extension: &str) -> PathBuf {
    let has_it = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if has_it {
        return path;
    }
    let mut name = path.into_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_resolve_file_name() {
        let explicit = resolve_file_name(Some(Path::new("out/plot")), Some("Title")).unwrap();
        assert_eq!(explicit, PathBuf::from("out/plot"));

        let from_title = resolve_file_name(None, Some("a/b: c")).unwrap();
        assert_eq!(from_title, PathBuf::from("a_b_ c"));

        let err = resolve_file_name(None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RuntimeUser);
    }

    #[test]
    fn test_ensure_extension() {
        assert_eq!(ensure_extension(PathBuf::from("plot"), "html"), PathBuf::from("plot.html"));
        assert_eq!(
            ensure_extension(PathBuf::from("plot.HTML"), "html"),
            PathBuf::from("plot.HTML")
        );
        assert_eq!(
            ensure_extension(PathBuf::from("v1.2"), "html"),
            PathBuf::from("v1.2.html")
        );
    }
}
