//! Image surfaces: pixel buffers in memory.

use crate::enums::{Format, Status};
use crate::error::{Error, Result};
use crate::ffi;
use crate::ffi_ext;
use crate::stream::ReadAdapter;
use crate::surface::Surface;
use crate::util::encode_filename;
use log::debug;
use std::fmt;
use std::io::Read;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::rc::Rc;

/// A surface whose pixels live in memory.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    surface: Surface,
}

impl ImageSurface {
    /// Wrap a surface already known to carry the image tag.
    pub(crate) fn from_surface_unchecked(surface: Surface) -> Self {
        Self { surface }
    }

    pub fn into_surface(self) -> Surface {
        self.surface
    }

    /// Create an image surface with zeroed pixels owned by the native library.
    pub fn create(format: Format, width: i32, height: i32) -> Result<Self> {
        let raw = unsafe { ffi::cairo_image_surface_create(format.into_raw(), width, height) };
        let surface = unsafe { Surface::adopt("cairo_image_surface_create", raw) }?;
        Ok(Self::from_surface_unchecked(surface))
    }

    /// Create an image surface that draws into `data`.
    ///
    /// The buffer is moved into the surface and lives as long as this
    /// wrapper or any of its clones. A `stride` of `None` selects the
    /// minimum stride for `format` and `width`.
    ///
    /// Handles taken from the native surface with
    /// [`Surface::to_raw_none`] must not outlive the wrapper.
    pub fn create_for_data<D>(
        data: D,
        format: Format,
        width: i32,
        height: i32,
        stride: Option<i32>,
    ) -> Result<Self>
    where
        D: AsMut<[u8]> + 'static,
    {
        let stride = match stride {
            Some(stride) => stride,
            None => Self::format_stride_for_width(format, width)?,
        };
        let mut pixels = ForeignPixels::new(data);
        let needed = stride.max(0) as usize * height.max(0) as usize;
        if pixels.len < needed {
            return Err(Error::BufferTooSmall {
                got: pixels.len,
                needed,
            });
        }

        let raw = unsafe {
            ffi::cairo_image_surface_create_for_data(
                pixels.as_mut_ptr(),
                format.into_raw(),
                width,
                height,
                stride,
            )
        };
        // On error the native surface is gone before `pixels` is dropped.
        let mut surface = unsafe { Surface::adopt("cairo_image_surface_create_for_data", raw) }?;
        surface.pixels = Some(Rc::new(pixels));
        Ok(Self::from_surface_unchecked(surface))
    }

    /// Decode a PNG image pulled from `source`.
    ///
    /// The source is read up to the end of the PNG data and no further.
    pub fn create_from_png<R: Read + ?Sized>(source: &mut R) -> Result<Self> {
        let mut adapter = ReadAdapter::new(source);
        let raw = unsafe {
            ffi::cairo_image_surface_create_from_png_stream(
                Some(adapter.func()),
                adapter.closure(),
            )
        };
        match unsafe { Surface::adopt("cairo_image_surface_create_from_png_stream", raw) } {
            Ok(surface) => Ok(Self::from_surface_unchecked(surface)),
            Err(err) => Err(adapter.attach(err)),
        }
    }

    /// Decode the PNG file at `path`.
    pub fn create_from_png_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let filename = encode_filename(path.as_ref())?;
        let raw = unsafe { ffi_ext::cairo_image_surface_create_from_png(filename.as_ptr()) };
        let surface = unsafe { Surface::adopt("cairo_image_surface_create_from_png", raw) }?;
        Ok(Self::from_surface_unchecked(surface))
    }

    /// Minimum row stride, in bytes, of `format` at `width` pixels.
    pub fn format_stride_for_width(format: Format, width: i32) -> Result<i32> {
        match unsafe { ffi::cairo_format_stride_for_width(format.into_raw(), width) } {
            -1 => Err(Error::InvalidStride { format, width }),
            stride => Ok(stride),
        }
    }

    /// [`Format::Invalid`] for a format this crate does not know.
    pub fn format(&self) -> Format {
        let raw = unsafe { ffi::cairo_image_surface_get_format(self.to_raw_none()) };
        Format::try_from(raw).unwrap_or(Format::Invalid)
    }

    pub fn width(&self) -> i32 {
        unsafe { ffi::cairo_image_surface_get_width(self.to_raw_none()) }
    }

    pub fn height(&self) -> i32 {
        unsafe { ffi::cairo_image_surface_get_height(self.to_raw_none()) }
    }

    pub fn stride(&self) -> i32 {
        unsafe { ffi::cairo_image_surface_get_stride(self.to_raw_none()) }
    }

    /// Borrow the pixel data for reading and writing.
    ///
    /// Needs the only reference to the native surface. Pending drawing is
    /// flushed first, which also detaches any mime data, and the surface is
    /// marked dirty when the returned guard is dropped.
    pub fn data(&mut self) -> Result<ImageSurfaceData<'_>> {
        let references = self.reference_count();
        if references != 1 {
            return Err(Error::NonExclusive(references));
        }
        self.flush()?;

        let len = self.stride().max(0) as usize * self.height().max(0) as usize;
        let ptr = unsafe { ffi::cairo_image_surface_get_data(self.to_raw_none()) };
        let bytes: &mut [u8] = if ptr.is_null() {
            self.status()?;
            // Finished surfaces have released their pixels.
            if len != 0 {
                return Err(Error::Native {
                    operation: "cairo_image_surface_get_data",
                    status: Status::NullPointer,
                });
            }
            &mut []
        } else {
            unsafe { std::slice::from_raw_parts_mut(ptr, len) }
        };
        Ok(ImageSurfaceData {
            surface: self,
            bytes,
        })
    }
}

impl Deref for ImageSurface {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        &self.surface
    }
}

/// Exclusive access to the pixels of an [`ImageSurface`].
pub struct ImageSurfaceData<'a> {
    surface: &'a mut ImageSurface,
    bytes: &'a mut [u8],
}

impl Deref for ImageSurfaceData<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &*self.bytes
    }
}

impl DerefMut for ImageSurfaceData<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }
}

impl Drop for ImageSurfaceData<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.surface.mark_dirty() {
            debug!("mark_dirty after pixel access failed: {err}");
        }
    }
}

impl fmt::Debug for ImageSurfaceData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSurfaceData")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Caller-supplied pixel memory bound to a native surface.
///
/// The owner is kept behind a raw pointer so the native library's pointer
/// into it never aliases a live `Box`.
pub(crate) struct ForeignPixels {
    owner: *mut dyn AsMut<[u8]>,
    ptr: *mut u8,
    len: usize,
}

impl ForeignPixels {
    fn new<D: AsMut<[u8]> + 'static>(data: D) -> Self {
        let owner: *mut dyn AsMut<[u8]> = Box::into_raw(Box::new(data));
        let bytes = unsafe { (*owner).as_mut() };
        Self {
            owner,
            ptr: bytes.as_mut_ptr(),
            len: bytes.len(),
        }
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr
    }
}

impl Drop for ForeignPixels {
    fn drop(&mut self) {
        drop(unsafe { Box::from_raw(self.owner) });
    }
}

impl fmt::Debug for ForeignPixels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignPixels")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}
