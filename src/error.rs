//! Error types and result utilities for figure construction and rendering.
//!
//! Every fallible operation in the crate returns [`PlotResult`]. The variants of
//! [`PlotError`] are grouped so callers can branch on the broad failure category
//! through [`PlotError::kind`] without matching on message text.

use std::fmt;

use thiserror::Error;

/// Convenience type alias for results that may contain a [`PlotError`].
pub type PlotResult<T> = Result<T, PlotError>;

/// Broad category of a [`PlotError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value had the wrong shape or type (e.g. a string where a number was expected).
    Type,
    /// A value had the right type but an unacceptable content.
    Value,
    /// The selected backend has no rendering rule for the requested configuration.
    Unsupported,
    /// The caller omitted information that could not be inferred.
    RuntimeUser,
    /// Writing output failed.
    Io,
    /// The underlying drawing library reported a failure.
    Render,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Type => "type",
            ErrorKind::Value => "value",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::RuntimeUser => "runtime",
            ErrorKind::Io => "io",
            ErrorKind::Render => "render",
        };
        f.write_str(name)
    }
}

/// Error types that can occur while building figures or handing them to a backend.
#[derive(Error, Debug)]
pub enum PlotError {
    /// A parameter had the wrong type.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// A parameter had an unacceptable value.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// The backend cannot express the requested configuration.
    #[error(transparent)]
    Unsupported(#[from] UnsupportedError),

    /// Required context was missing, e.g. saving an untitled figure without a file name.
    #[error("Missing {what}: {hint}")]
    MissingContext {
        /// What was missing.
        what: String,
        /// How the caller can supply it.
        hint: String,
    },

    /// I/O error while writing a rendered figure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The drawing library failed while rendering.
    #[error("Rendering error in {backend} backend: {reason}")]
    Render {
        /// Backend that failed.
        backend: String,
        /// Failure reported by the drawing library.
        reason: String,
    },
}

impl PlotError {
    /// Returns the broad category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            PlotError::Type(_) => ErrorKind::Type,
            PlotError::Value(_) => ErrorKind::Value,
            PlotError::Unsupported(_) => ErrorKind::Unsupported,
            PlotError::MissingContext { .. } => ErrorKind::RuntimeUser,
            PlotError::Io(_) => ErrorKind::Io,
            PlotError::Render { .. } => ErrorKind::Render,
        }
    }

    /// Create a type error for `parameter`.
    pub fn invalid_type(
        parameter: impl Into<String>,
        expected: impl Into<String>,
        received: impl Into<String>,
    ) -> Self {
        Self::Type(TypeError::new(parameter, expected, received))
    }

    /// Create a value error for `parameter`.
    pub fn invalid_value(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Value(ValueError::invalid_value(parameter, reason))
    }

    /// Create an unsupported-configuration error.
    pub fn unsupported(backend: impl Into<String>, what: impl Into<String>) -> Self {
        Self::Unsupported(UnsupportedError::new(backend, what))
    }

    /// Create a missing-context error.
    pub fn missing(what: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingContext {
            what: what.into(),
            hint: hint.into(),
        }
    }

    /// Create a rendering error.
    pub fn render(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Render {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

/// A parameter was given a value of the wrong type or shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid type for '{parameter}': expected {expected}, got {received}")]
pub struct TypeError {
    /// Name of the offending parameter.
    pub parameter: String,
    /// Description of the accepted type.
    pub expected: String,
    /// Description of what was supplied.
    pub received: String,
}

impl TypeError {
    /// Create a new type error.
    pub fn new(
        parameter: impl Into<String>,
        expected: impl Into<String>,
        received: impl Into<String>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            expected: expected.into(),
            received: received.into(),
        }
    }
}

/// A parameter had the right type but an invalid value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for '{parameter}': {reason}")]
pub struct ValueError {
    /// Name of the offending parameter.
    pub parameter: String,
    /// Why the value was rejected.
    pub reason: String,
}

impl ValueError {
    /// Create a new value error.
    pub fn invalid_value(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

/// A backend has no rendering rule for a configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("The {backend} backend does not support {what}")]
pub struct UnsupportedError {
    /// Backend that rejected the configuration.
    pub backend: String,
    /// The unsupported configuration.
    pub what: String,
}

impl UnsupportedError {
    /// Create a new unsupported-configuration error.
    pub fn new(backend: impl Into<String>, what: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            what: what.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            PlotError::invalid_type("label", "string", "number").kind(),
            ErrorKind::Type
        );
        assert_eq!(
            PlotError::invalid_value("alpha", "must be in [0, 1]").kind(),
            ErrorKind::Value
        );
        assert_eq!(
            PlotError::unsupported("plotly", "uneven contour levels").kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            PlotError::missing("file name", "set a title").kind(),
            ErrorKind::RuntimeUser
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(PlotError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_messages_name_the_parameter() {
        let err = PlotError::invalid_value("linewidth", "must be non-negative, got -1");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'linewidth': must be non-negative, got -1"
        );

        let err = PlotError::invalid_type("color", "array of 3 integers", "string");
        assert!(err.to_string().contains("'color'"));
    }
}
