//! Status checking for cairo calls.

use crate::enums::Status;
use crate::error::{Error, Result};
use libc::c_int;

/// Turns the status code reported by `operation` into a `Result`.
///
/// Called right after the native call; failures are never deferred.
#[inline]
pub(crate) fn check(operation: &'static str, code: c_int) -> Result<()> {
    match Status::from_raw(code) {
        Status::Success => Ok(()),
        status => Err(Error::Native { operation, status }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check() {
        assert!(check("cairo_surface_status", 0).is_ok());
        match check("cairo_surface_write_to_png_stream", Status::WriteError.into_raw()) {
            Err(Error::Native { operation, status }) => {
                assert_eq!(operation, "cairo_surface_write_to_png_stream");
                assert_eq!(status, Status::WriteError);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_code_is_an_error() {
        let err = check("cairo_surface_status", 977).unwrap_err();
        assert_eq!(err.status(), Some(Status::Other(977)));
    }
}
