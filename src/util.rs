//! Conversions of host values into C strings for native calls.

use crate::error::{Error, Result};
use std::ffi::CString;
use std::path::Path;

/// Encode a path the way the native library expects filenames.
///
/// On Unix the raw bytes of the path are passed unchanged. Elsewhere the
/// path must be valid UTF-8. Paths with interior NUL bytes are rejected.
pub(crate) fn encode_filename(path: &Path) -> Result<CString> {
    #[cfg(unix)]
    let bytes = {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    };
    #[cfg(not(unix))]
    let bytes = match path.to_str() {
        Some(s) => s.as_bytes().to_vec(),
        None => return Err(Error::InvalidPath(path.to_path_buf())),
    };

    CString::new(bytes).map_err(|_| Error::InvalidPath(path.to_path_buf()))
}

/// Convert a mime type to a C string.
pub(crate) fn mime_to_cstr(mime_type: &str) -> Result<CString> {
    CString::new(mime_type).map_err(|_| Error::InvalidMimeType(mime_type.to_string()))
}
