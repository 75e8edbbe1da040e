//! Adapters between native read/write callbacks and `std::io` endpoints.
//!
//! An adapter lives on the stack of the binding call that needs it and is
//! passed to the native library as `(func, closure)`. It outlives the one
//! native call it serves, and the native library invokes it strictly
//! sequentially within that call.
//!
//! Nothing unwinds out of a callback: I/O errors and panics become
//! `ReadError` / `WriteError`, and the host-side error is kept on the
//! adapter so the caller can report it once the native call returns.

use crate::enums::Status;
use crate::error::Error;
use libc::{c_int, c_uint, c_void};
use log::{debug, warn};
use std::io::{self, Read, Write};
use std::panic::{self, AssertUnwindSafe};

/// Read callback in the shape of `cairo_read_func_t`.
pub(crate) type ReadFunc = unsafe extern "C" fn(*mut c_void, *mut u8, c_uint) -> c_int;

/// Write callback in the shape of `cairo_write_func_t`.
pub(crate) type WriteFunc = unsafe extern "C" fn(*mut c_void, *const u8, c_uint) -> c_int;

/// Serves native read requests from a [`Read`] source.
pub(crate) struct ReadAdapter<'a, R: Read + ?Sized> {
    source: &'a mut R,
    error: Option<io::Error>,
}

impl<'a, R: Read + ?Sized> ReadAdapter<'a, R> {
    pub(crate) fn new(source: &'a mut R) -> Self {
        Self {
            source,
            error: None,
        }
    }

    pub(crate) fn func(&self) -> ReadFunc {
        read_trampoline::<R>
    }

    pub(crate) fn closure(&mut self) -> *mut c_void {
        self as *mut Self as *mut c_void
    }

    /// Attach the host-side failure, if any, to an error from the native call.
    pub(crate) fn attach(self, error: Error) -> Error {
        attach(self.error, error)
    }

    /// Fills `dest` completely or leaves it untouched.
    fn fill(&mut self, dest: &mut [u8]) -> Status {
        let mut buffer = vec![0u8; dest.len()];
        let mut filled = 0;
        while filled < buffer.len() {
            match self.source.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!("read callback failed: {e}");
                    self.error = Some(e);
                    return Status::ReadError;
                }
            }
        }
        if filled < buffer.len() {
            debug!(
                "read callback hit end of input: {filled} of {} bytes",
                buffer.len()
            );
            self.error = Some(io::Error::from(io::ErrorKind::UnexpectedEof));
            return Status::ReadError;
        }
        dest.copy_from_slice(&buffer);
        Status::Success
    }
}

unsafe extern "C" fn read_trampoline<R: Read + ?Sized>(
    closure: *mut c_void,
    data: *mut u8,
    length: c_uint,
) -> c_int {
    let adapter = unsafe { &mut *(closure as *mut ReadAdapter<'_, R>) };
    if length == 0 {
        return Status::Success.into_raw();
    }
    if data.is_null() {
        return Status::ReadError.into_raw();
    }
    let dest = unsafe { std::slice::from_raw_parts_mut(data, length as usize) };
    let status = match panic::catch_unwind(AssertUnwindSafe(|| adapter.fill(dest))) {
        Ok(status) => status,
        Err(_) => {
            warn!("read callback panicked");
            adapter.error = Some(io::Error::other("read callback panicked"));
            Status::ReadError
        }
    };
    status.into_raw()
}

/// Forwards native write requests to a [`Write`] sink.
pub(crate) struct WriteAdapter<'a, W: Write + ?Sized> {
    sink: &'a mut W,
    error: Option<io::Error>,
}

impl<'a, W: Write + ?Sized> WriteAdapter<'a, W> {
    pub(crate) fn new(sink: &'a mut W) -> Self {
        Self { sink, error: None }
    }

    pub(crate) fn func(&self) -> WriteFunc {
        write_trampoline::<W>
    }

    pub(crate) fn closure(&mut self) -> *mut c_void {
        self as *mut Self as *mut c_void
    }

    pub(crate) fn attach(self, error: Error) -> Error {
        attach(self.error, error)
    }

    fn forward(&mut self, bytes: &[u8]) -> Status {
        match self.sink.write_all(bytes) {
            Ok(()) => Status::Success,
            Err(e) => {
                debug!("write callback failed: {e}");
                self.error = Some(e);
                Status::WriteError
            }
        }
    }
}

unsafe extern "C" fn write_trampoline<W: Write + ?Sized>(
    closure: *mut c_void,
    data: *const u8,
    length: c_uint,
) -> c_int {
    let adapter = unsafe { &mut *(closure as *mut WriteAdapter<'_, W>) };
    if length == 0 {
        return Status::Success.into_raw();
    }
    if data.is_null() {
        return Status::WriteError.into_raw();
    }
    let bytes = unsafe { std::slice::from_raw_parts(data, length as usize) };
    let status = match panic::catch_unwind(AssertUnwindSafe(|| adapter.forward(bytes))) {
        Ok(status) => status,
        Err(_) => {
            warn!("write callback panicked");
            adapter.error = Some(io::Error::other("write callback panicked"));
            Status::WriteError
        }
    };
    status.into_raw()
}

fn attach(host: Option<io::Error>, error: Error) -> Error {
    match (host, error) {
        (Some(source), Error::Native { operation, status }) => Error::Stream {
            operation,
            status,
            source,
        },
        (_, error) => error,
    }
}
