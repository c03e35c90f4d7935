use std::io;
use std::path::PathBuf;

use quick_xml::de::DeError;
use thiserror::Error;

/// Errors raised while turning a map document into a [`Map`](crate::Map).
///
/// Every variant is recoverable: callers fall back to
/// [`generate_placeholder`](crate::generate_placeholder), which is what
/// [`Map::load_or_placeholder`](crate::Map::load_or_placeholder) does.
#[derive(Debug, Error)]
pub enum MapError {
    /// The map document does not exist.
    #[error("map document not found: {}", path.display())]
    ResourceNotFound {
        /// Path that was looked up.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The document exists but could not be read.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The document is not well-formed or a required attribute is missing or non-numeric.
    #[error("malformed map document {}: {source}", path.display())]
    Xml {
        /// Document that failed to parse.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: DeError,
    },

    /// The document parsed but is structurally unusable.
    #[error("invalid map {}: {reason}", path.display())]
    InvalidMap {
        /// Offending document.
        path: PathBuf,
        /// What is missing or wrong.
        reason: String,
    },

    /// Only TMX/XML documents are understood.
    #[error("unsupported map format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

impl MapError {
    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MapError::InvalidMap {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            MapError::ResourceNotFound { path, source }
        } else {
            MapError::Io { path, source }
        }
    }

    /// The source document could not be located.
    pub fn is_resource_not_found(&self) -> bool {
        matches!(self, MapError::ResourceNotFound { .. })
    }

    /// The document was found but is structurally invalid.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            MapError::Xml { .. } | MapError::InvalidMap { .. } | MapError::UnsupportedFormat(_)
        )
    }
}
