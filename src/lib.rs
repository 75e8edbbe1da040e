//! Surface resource bindings over the cairo 2D graphics library.
//!
//! cairo is reached through [`ffi`] (`cairo-sys-rs`). On top of it this
//! crate provides owning wrappers ([`Surface`], [`ImageSurface`],
//! [`AnySurface`]) that turn statuses into [`Error`]s, bridge cairo's
//! stream callbacks to `std::io`, and keep host buffers alive while cairo
//! may read them ([`KeepAlive`]).
//!
//! # Thread Safety
//!
//! Surfaces are NOT `Send` or `Sync`. All operations on a surface must occur
//! from the thread that created it. The [`KeepAlive`] registry is the only
//! process-wide state and is internally synchronized.
//!
//! # Memory Management
//!
//! - Each wrapper owns one cairo reference and releases it on drop
//! - cairo constructors never return NULL; failures come back as error
//!   surfaces, which the wrappers destroy before reporting the error
//! - Mime data is released through its destroy notification when the entry
//!   is replaced or removed, or when the last surface reference goes away
//!
//! # Example
//!
//! ```
//! use lumen::{Format, ImageSurface};
//!
//! let mut surface = ImageSurface::create(Format::Argb32, 16, 16)?;
//! surface.data()?.fill(0xff);
//!
//! let mut png = Vec::new();
//! surface.write_to_png(&mut png)?;
//! let decoded = ImageSurface::create_from_png(&mut png.as_slice())?;
//! assert_eq!(decoded.width(), 16);
//! # Ok::<(), lumen::Error>(())
//! ```

#![allow(clippy::missing_safety_doc)]

pub use cairo_sys as ffi;

mod dispatch;
mod enums;
mod error;
mod ffi_ext;
mod image;
mod keep_alive;
mod status;
mod stream;
mod surface;
mod util;

pub use dispatch::AnySurface;
pub use enums::{Content, Format, Rectangle, Status, SurfaceType};
pub use error::{Error, Result};
pub use image::{ImageSurface, ImageSurfaceData};
pub use keep_alive::{DestroyFunc, KeepAlive};
pub use surface::Surface;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    #[test_log::test]
    fn test_cairo_surface_wrapped_from_c() {
        // A handle created on the C side, then handed over to the bindings.
        let raw = unsafe { ffi::cairo_image_surface_create(Format::A8.into_raw(), 3, 3) };
        let any = AnySurface::from_surface(unsafe { Surface::from_raw_full(raw) }.unwrap());
        let image = any.into_image().unwrap();
        assert_eq!(image.stride(), 4);
        assert_eq!(image.reference_count(), 1);
    }

    #[test_log::test]
    fn test_decode_then_attach_source() {
        let mut surface = ImageSurface::create(Format::Argb32, 4, 4).unwrap();
        surface.data().unwrap().fill(0xff);
        let mut png = Vec::new();
        surface.write_to_png(&mut png).unwrap();
        let png: Arc<[u8]> = png.into();

        let mut decoded = ImageSurface::create_from_png(&mut Cursor::new(&png[..])).unwrap();
        assert_eq!(decoded.data().unwrap()[..4], [0xff; 4]);
        decoded.set_mime_data("image/png", Arc::clone(&png)).unwrap();

        // The attached source is what a later export would reuse.
        assert_eq!(
            decoded.mime_data("image/png").unwrap().as_deref(),
            Some(&png[..])
        );
        // Pixel access flushes, which detaches the now stale source.
        drop(decoded.data().unwrap());
        assert_eq!(decoded.mime_data("image/png").unwrap(), None);
        assert_eq!(Arc::strong_count(&png), 1);
    }

    #[test_log::test]
    fn test_similar_chain_preserves_tags() {
        let recording = Surface::create_recording(Content::ColorAlpha, None).unwrap();
        let similar = recording.create_similar(Content::Color, 8, 8).unwrap();
        assert_eq!(similar.surface_type(), SurfaceType::Recording);
        assert!(similar.as_image().is_none());

        let image = similar.create_similar_image(Format::A1, 8, 8).unwrap();
        let again = image.create_similar(Content::Alpha, 2, 2).unwrap();
        assert_eq!(again.as_image().map(|image| image.format()), Some(Format::A8));
    }

    #[test_log::test]
    fn test_surface_from_config() {
        let (format, width, height): (Format, i32, i32) =
            serde_json::from_str(r#"["rgb24", 12, 4]"#).unwrap();
        let surface = ImageSurface::create(format, width, height).unwrap();
        assert_eq!(surface.format(), Format::Rgb24);
        assert_eq!(surface.stride(), 48);
    }
}
