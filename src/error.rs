//! Error types.
//!
//! Boundary failures (I/O, bad arguments, mutating a document that cannot be
//! mutated) come back as [`ProjectError`].  Problems with the document's
//! *content* are not errors in that sense: a [`ParseError`] is stored on the
//! document so the raw text stays inspectable and editable.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for fallible project operations.
pub type Result<T> = std::result::Result<T, ProjectError>;

/// Errors surfaced synchronously to the caller of a specific operation.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Reading or writing the project file failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A setter expecting a path was handed something that is not one.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The document text does not parse, so it has no tree to mutate or save.
    #[error("the project document is not valid XML")]
    InvalidDocument,

    /// The document parses but its root is not a project element.
    #[error("unexpected root element <{found}>, expected <NUnitProject>")]
    SchemaMismatch { found: String },

    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// `save()` was called before any path was assigned.
    #[error("the project has no path; use save_as")]
    NoProjectPath,
}

impl ProjectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Malformed document text.  Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl From<roxmltree::Error> for ParseError {
    fn from(error: roxmltree::Error) -> Self {
        let pos = error.pos();
        // roxmltree embeds " at row:col" in its text; the position is kept separately.
        let message = error.to_string().replacen(&format!(" at {pos}"), "", 1);
        Self {
            message,
            line: pos.row,
            column: pos.col,
        }
    }
}

/// Rejections produced by the caller-side checks in [`crate::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no configuration name provided")]
    EmptyName,

    #[error("a configuration named '{0}' already exists")]
    DuplicateName(String),

    #[error("invalid path for {property}: {reason}")]
    InvalidPath { property: String, reason: String },

    #[error("path {0} is an absolute path; private bin path components must all be relative")]
    AbsoluteBinPath(String),

    #[error("configuration file '{0}' must be a file name only, without a directory")]
    ConfigFileHasDirectory(String),
}
