//! Owning wrapper around a native surface handle.

use crate::dispatch::{self, AnySurface};
use crate::enums::{Content, Format, Rectangle, SurfaceType};
use crate::error::{Error, Result};
use crate::ffi::{self, cairo_surface_t};
use crate::ffi_ext;
use crate::image::{ForeignPixels, ImageSurface};
use crate::keep_alive::KeepAlive;
use crate::status::check;
use crate::stream::WriteAdapter;
use crate::util::{encode_filename, mime_to_cstr};
use libc::c_ulong;
use log::{trace, warn};
use std::io::Write;
use std::mem::ManuallyDrop;
use std::path::Path;
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::Arc;

#[cfg(test)]
thread_local! {
    static ADOPTED: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Number of native handles handed to [`Surface::adopt`] on this thread.
#[cfg(test)]
pub(crate) fn adopted() -> usize {
    ADOPTED.with(|count| count.get())
}

/// A reference to a native surface.
///
/// Each `Surface` owns exactly one native reference and releases it when
/// dropped. Cloning takes another native reference.
///
/// # Thread Safety
///
/// `Surface` is neither `Send` nor `Sync`; the native library does not
/// synchronize access to a surface.
#[derive(Debug)]
pub struct Surface {
    handle: NonNull<cairo_surface_t>,
    /// Caller-supplied pixel memory the native surface draws into.
    pub(crate) pixels: Option<Rc<ForeignPixels>>,
}

impl Surface {
    /// Take ownership of a handle returned by `operation`.
    ///
    /// The handle is released exactly once: here if its status is an error,
    /// otherwise when the returned `Surface` is dropped.
    ///
    /// # Safety
    ///
    /// `raw` must be NULL or a surface reference the caller owns.
    pub(crate) unsafe fn adopt(operation: &'static str, raw: *mut cairo_surface_t) -> Result<Self> {
        #[cfg(test)]
        ADOPTED.with(|count| count.set(count.get() + 1));
        let handle = NonNull::new(raw).ok_or(Error::NullHandle)?;
        let status = unsafe { ffi::cairo_surface_status(raw) };
        if let Err(err) = check(operation, status) {
            unsafe { ffi::cairo_surface_destroy(raw) };
            return Err(err);
        }
        trace!("adopted surface {raw:p} from {operation}");
        Ok(Self {
            handle,
            pixels: None,
        })
    }

    /// Wrap a surface reference owned by the caller, without dispatch.
    ///
    /// # Safety
    ///
    /// `raw` must be NULL or a surface reference the caller owns; ownership
    /// passes to the returned value even on error.
    pub unsafe fn from_raw_full(raw: *mut cairo_surface_t) -> Result<Self> {
        unsafe { Self::adopt("cairo_surface_status", raw) }
    }

    /// Wrap a borrowed surface, taking a new reference on it.
    ///
    /// # Safety
    ///
    /// `raw` must be NULL or a live surface.
    pub unsafe fn from_raw_none(raw: *mut cairo_surface_t) -> Result<Self> {
        unsafe { Self::adopt("cairo_surface_reference", ffi::cairo_surface_reference(raw)) }
    }

    /// The native handle, still owned by `self`.
    pub fn to_raw_none(&self) -> *mut cairo_surface_t {
        self.handle.as_ptr()
    }

    /// Give up ownership of the native reference without releasing it.
    /// A foreign pixel buffer bound to the surface is leaked.
    pub fn into_raw(self) -> *mut cairo_surface_t {
        ManuallyDrop::new(self).handle.as_ptr()
    }

    #[inline]
    fn ptr(&self) -> *mut cairo_surface_t {
        self.handle.as_ptr()
    }

    /// Report the sticky native status as the outcome of `operation`.
    fn checked(&self, operation: &'static str) -> Result<()> {
        check(operation, unsafe { ffi::cairo_surface_status(self.ptr()) })
    }

    /// The status of the surface: the first error recorded on it, if any.
    pub fn status(&self) -> Result<()> {
        self.checked("cairo_surface_status")
    }

    pub fn surface_type(&self) -> SurfaceType {
        SurfaceType::from_raw(unsafe { ffi::cairo_surface_get_type(self.ptr()) })
    }

    pub fn content(&self) -> Content {
        let raw = unsafe { ffi::cairo_surface_get_content(self.ptr()) };
        Content::try_from(raw).unwrap_or_else(|_| {
            warn!("unknown content {raw:#x}, assuming color and alpha");
            Content::ColorAlpha
        })
    }

    pub fn reference_count(&self) -> u32 {
        unsafe { ffi::cairo_surface_get_reference_count(self.ptr()) }
    }

    /// Finish the surface. Drawing-related calls fail afterwards; the
    /// native reference is still released on drop.
    pub fn finish(&self) -> Result<()> {
        unsafe { ffi::cairo_surface_finish(self.ptr()) };
        self.checked("cairo_surface_finish")
    }

    pub fn flush(&self) -> Result<()> {
        unsafe { ffi::cairo_surface_flush(self.ptr()) };
        self.checked("cairo_surface_flush")
    }

    pub fn copy_page(&self) -> Result<()> {
        unsafe { ffi_ext::cairo_surface_copy_page(self.ptr()) };
        self.checked("cairo_surface_copy_page")
    }

    pub fn show_page(&self) -> Result<()> {
        unsafe { ffi_ext::cairo_surface_show_page(self.ptr()) };
        self.checked("cairo_surface_show_page")
    }

    pub fn device_offset(&self) -> (f64, f64) {
        let (mut x, mut y) = (0.0, 0.0);
        unsafe { ffi::cairo_surface_get_device_offset(self.ptr(), &mut x, &mut y) };
        (x, y)
    }

    pub fn set_device_offset(&self, x_offset: f64, y_offset: f64) -> Result<()> {
        unsafe { ffi::cairo_surface_set_device_offset(self.ptr(), x_offset, y_offset) };
        self.checked("cairo_surface_set_device_offset")
    }

    /// Fallback resolution in pixels per inch.
    pub fn fallback_resolution(&self) -> (f64, f64) {
        let (mut x, mut y) = (0.0, 0.0);
        unsafe { ffi::cairo_surface_get_fallback_resolution(self.ptr(), &mut x, &mut y) };
        (x, y)
    }

    pub fn set_fallback_resolution(
        &self,
        x_pixels_per_inch: f64,
        y_pixels_per_inch: f64,
    ) -> Result<()> {
        unsafe {
            ffi::cairo_surface_set_fallback_resolution(
                self.ptr(),
                x_pixels_per_inch,
                y_pixels_per_inch,
            )
        };
        self.checked("cairo_surface_set_fallback_resolution")
    }

    /// Copy of the data attached under `mime_type`, if any.
    pub fn mime_data(&self, mime_type: &str) -> Result<Option<Vec<u8>>> {
        let mime_type = mime_to_cstr(mime_type)?;
        let mut data: *mut u8 = std::ptr::null_mut();
        let mut length: c_ulong = 0;
        unsafe {
            ffi::cairo_surface_get_mime_data(
                self.ptr(),
                mime_type.as_ptr(),
                &mut data as *mut *mut u8 as *const *mut u8,
                &mut length,
            )
        };
        if data.is_null() {
            return Ok(None);
        }
        let bytes = unsafe { std::slice::from_raw_parts(data, length as usize) };
        Ok(Some(bytes.to_vec()))
    }

    /// Attach `data` under `mime_type`.
    ///
    /// The data stays pinned until the native library releases it, which
    /// may be long after this call: when the entry is replaced or removed,
    /// or when the last reference to the surface goes away.
    pub fn set_mime_data(&self, mime_type: &str, data: impl Into<Arc<[u8]>>) -> Result<()> {
        let mime_type = mime_to_cstr(mime_type)?;
        let data: Arc<[u8]> = data.into();
        let (ptr, length) = (data.as_ptr(), data.len() as c_ulong);

        let pin = KeepAlive::pin(data);
        let (destroy, closure) = pin.closure();
        let status = unsafe {
            ffi::cairo_surface_set_mime_data(
                self.ptr(),
                mime_type.as_ptr(),
                ptr,
                length,
                Some(destroy),
                closure as *const u8,
            )
        };
        if status != 0 {
            // cairo did not take the data.
            pin.cancel();
        }
        check("cairo_surface_set_mime_data", status)
    }

    /// Detach the data stored under `mime_type`, releasing its pin.
    pub fn remove_mime_data(&self, mime_type: &str) -> Result<()> {
        let mime_type = mime_to_cstr(mime_type)?;
        let status = unsafe {
            ffi::cairo_surface_set_mime_data(
                self.ptr(),
                mime_type.as_ptr(),
                std::ptr::null(),
                0,
                None,
                std::ptr::null_mut(),
            )
        };
        check("cairo_surface_set_mime_data", status)
    }

    pub fn supports_mime_type(&self, mime_type: &str) -> Result<bool> {
        let mime_type = mime_to_cstr(mime_type)?;
        Ok(unsafe { ffi::cairo_surface_supports_mime_type(self.ptr(), mime_type.as_ptr()) }
            .as_bool())
    }

    pub fn mark_dirty(&self) -> Result<()> {
        unsafe { ffi::cairo_surface_mark_dirty(self.ptr()) };
        self.checked("cairo_surface_mark_dirty")
    }

    pub fn mark_dirty_rectangle(&self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        unsafe { ffi::cairo_surface_mark_dirty_rectangle(self.ptr(), x, y, width, height) };
        self.checked("cairo_surface_mark_dirty_rectangle")
    }

    /// Create a surface of the same kind, dispatched to its wrapper type.
    pub fn create_similar(&self, content: Content, width: i32, height: i32) -> Result<AnySurface> {
        let raw = unsafe {
            ffi::cairo_surface_create_similar(self.ptr(), content.into_raw(), width, height)
        };
        unsafe { dispatch::from_raw("cairo_surface_create_similar", raw) }
    }

    pub fn create_similar_image(
        &self,
        format: Format,
        width: i32,
        height: i32,
    ) -> Result<ImageSurface> {
        let raw = unsafe {
            ffi::cairo_surface_create_similar_image(self.ptr(), format.into_raw(), width, height)
        };
        unsafe { dispatch::from_raw("cairo_surface_create_similar_image", raw) }?.into_image()
    }

    /// Create a recording surface, optionally bounded by `extents`.
    ///
    /// Recording surfaces have no specialized wrapper and come back as
    /// [`AnySurface::Generic`].
    pub fn create_recording(content: Content, extents: Option<Rectangle>) -> Result<AnySurface> {
        let extents = extents.map(ffi::cairo_rectangle_t::from);
        let extents_ptr = extents
            .as_ref()
            .map_or(std::ptr::null(), |rect| rect as *const ffi::cairo_rectangle_t);
        let raw = unsafe { ffi::cairo_recording_surface_create(content.into_raw(), extents_ptr) };
        unsafe { dispatch::from_raw("cairo_recording_surface_create", raw) }
    }

    /// Bounds of a recording surface, `None` when unbounded.
    pub fn recording_extents(&self) -> Result<Option<Rectangle>> {
        let found = self.surface_type();
        if found != SurfaceType::Recording {
            return Err(Error::SurfaceTypeMismatch {
                expected: SurfaceType::Recording,
                found,
            });
        }
        let mut extents = ffi::cairo_rectangle_t::from(Rectangle::default());
        let bounded =
            unsafe { ffi::cairo_recording_surface_get_extents(self.ptr(), &mut extents) };
        self.checked("cairo_recording_surface_get_extents")?;
        Ok(bounded.as_bool().then(|| Rectangle::from(extents)))
    }

    /// Font options are not bound; this always fails.
    pub fn font_options(&self) -> Result<()> {
        Err(Error::NotImplemented {
            operation: "cairo_surface_get_font_options",
        })
    }

    /// Encode the surface as PNG into `sink`.
    ///
    /// The write is all or nothing from the caller's point of view: any
    /// failure of `sink` is reported as an error.
    pub fn write_to_png<W: Write + ?Sized>(&self, sink: &mut W) -> Result<()> {
        let mut adapter = WriteAdapter::new(sink);
        let status = unsafe {
            ffi::cairo_surface_write_to_png_stream(
                self.ptr(),
                Some(adapter.func()),
                adapter.closure(),
            )
        };
        check("cairo_surface_write_to_png_stream", status).map_err(|e| adapter.attach(e))
    }

    /// Encode the surface as PNG into the file at `path`.
    pub fn write_to_png_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let filename = encode_filename(path.as_ref())?;
        let status = unsafe { ffi_ext::cairo_surface_write_to_png(self.ptr(), filename.as_ptr()) };
        check("cairo_surface_write_to_png", status)
    }
}

impl Clone for Surface {
    fn clone(&self) -> Self {
        unsafe { ffi::cairo_surface_reference(self.ptr()) };
        Self {
            handle: self.handle,
            pixels: self.pixels.clone(),
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        trace!("releasing surface {:p}", self.handle);
        unsafe { ffi::cairo_surface_destroy(self.handle.as_ptr()) };
    }
}

/// Sticky status of the native surface, for assertions in tests.
#[cfg(test)]
pub(crate) fn native_status(surface: &Surface) -> crate::enums::Status {
    crate::enums::Status::from_raw(unsafe { ffi::cairo_surface_status(surface.ptr()) })
}
