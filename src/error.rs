//! Error handling for the binding layer.
//!
//! Native failures keep their [`Status`] and the name of the native call
//! that reported them. Preconditions the native library cannot check are
//! reported before any native call is made.

use crate::enums::{Format, Status, SurfaceType};
use std::io;
use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A native call reported a failure status.
    #[error("{operation} failed: {status}")]
    Native {
        operation: &'static str,
        status: Status,
    },

    /// A stream callback failed on the host side; the native call then
    /// reported `status`.
    #[error("{operation} failed: {status}: {source}")]
    Stream {
        operation: &'static str,
        status: Status,
        #[source]
        source: io::Error,
    },

    /// The native library handed back a NULL surface.
    #[error("null surface handle")]
    NullHandle,

    #[error("got a {got} bytes buffer, needs at least {needed}")]
    BufferTooSmall { got: usize, needed: usize },

    #[error("no valid stride for {format:?} at width {width}")]
    InvalidStride { format: Format, width: i32 },

    /// The path cannot be expressed in the native filename encoding.
    #[error("path {0:?} cannot be passed to the native library")]
    InvalidPath(PathBuf),

    #[error("invalid mime type {0:?}")]
    InvalidMimeType(String),

    #[error("expected a {expected:?} surface, found {found:?}")]
    SurfaceTypeMismatch {
        expected: SurfaceType,
        found: SurfaceType,
    },

    /// Pixel access needs the only reference to the surface.
    #[error("surface is shared by {0} references")]
    NonExclusive(u32),

    /// The operation exists in cairo but has no binding in this crate.
    #[error("{operation} is not implemented")]
    NotImplemented { operation: &'static str },
}

impl Error {
    /// Native status behind this error, if a native call reported one.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Native { status, .. } | Error::Stream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessor() {
        let err = Error::Native {
            operation: "cairo_surface_flush",
            status: Status::SurfaceFinished,
        };
        assert_eq!(err.status(), Some(Status::SurfaceFinished));
        assert_eq!(
            err.to_string(),
            "cairo_surface_flush failed: the target surface has been finished"
        );
        assert_eq!(Error::NullHandle.status(), None);
    }

    #[test]
    fn test_buffer_too_small_message() {
        let err = Error::BufferTooSmall { got: 10, needed: 64 };
        assert_eq!(err.to_string(), "got a 10 bytes buffer, needs at least 64");
    }

    #[test]
    fn test_not_implemented_has_no_status() {
        let err = Error::NotImplemented {
            operation: "cairo_surface_get_font_options",
        };
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "cairo_surface_get_font_options is not implemented");
    }
}
