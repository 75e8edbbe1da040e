//! Selection of the wrapper type for a surface by its native type tag.

use crate::enums::SurfaceType;
use crate::error::{Error, Result};
use crate::ffi::cairo_surface_t;
use crate::image::ImageSurface;
use crate::surface::Surface;
use log::trace;
use std::ops::Deref;

/// A surface wrapped in the most specific type known for its tag.
#[derive(Debug, Clone)]
pub enum AnySurface {
    Image(ImageSurface),
    /// A surface type with no specialized wrapper.
    Generic(Surface),
}

type Specialize = fn(Surface) -> AnySurface;

/// Specialized wrappers, keyed by native type tag.
const SPECIALIZATIONS: &[(SurfaceType, Specialize)] = &[(SurfaceType::Image, image as Specialize)];

fn image(surface: Surface) -> AnySurface {
    AnySurface::Image(ImageSurface::from_surface_unchecked(surface))
}

impl AnySurface {
    /// Wrap `surface` according to its type tag. Unknown tags fall back to
    /// [`AnySurface::Generic`].
    pub fn from_surface(surface: Surface) -> Self {
        let tag = surface.surface_type();
        match SPECIALIZATIONS.iter().find(|(known, _)| *known == tag) {
            Some((_, specialize)) => specialize(surface),
            None => {
                trace!("no specialized wrapper for {tag:?}");
                AnySurface::Generic(surface)
            }
        }
    }

    pub fn as_image(&self) -> Option<&ImageSurface> {
        match self {
            AnySurface::Image(image) => Some(image),
            AnySurface::Generic(_) => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageSurface> {
        match self {
            AnySurface::Image(image) => Some(image),
            AnySurface::Generic(_) => None,
        }
    }

    pub fn into_image(self) -> Result<ImageSurface> {
        match self {
            AnySurface::Image(image) => Ok(image),
            AnySurface::Generic(surface) => Err(Error::SurfaceTypeMismatch {
                expected: SurfaceType::Image,
                found: surface.surface_type(),
            }),
        }
    }

    pub fn into_surface(self) -> Surface {
        match self {
            AnySurface::Image(image) => image.into_surface(),
            AnySurface::Generic(surface) => surface,
        }
    }
}

impl Deref for AnySurface {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        match self {
            AnySurface::Image(image) => image,
            AnySurface::Generic(surface) => surface,
        }
    }
}

/// Adopt a surface returned by `operation` and wrap it by its tag.
///
/// # Safety
///
/// `raw` must be NULL or a surface reference the caller owns.
pub(crate) unsafe fn from_raw(operation: &'static str, raw: *mut cairo_surface_t) -> Result<AnySurface> {
    unsafe { Surface::adopt(operation, raw) }.map(AnySurface::from_surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{Content, Format};

    #[test_log::test]
    fn test_image_tag_is_specialized() {
        let surface = ImageSurface::create(Format::Rgb24, 2, 2)
            .unwrap()
            .into_surface();
        let any = AnySurface::from_surface(surface);
        assert!(any.as_image().is_some());
        assert_eq!(any.into_image().unwrap().format(), Format::Rgb24);
    }

    #[test_log::test]
    fn test_unknown_tag_is_generic() {
        let mut any = Surface::create_recording(Content::Color, None).unwrap();
        assert!(matches!(any, AnySurface::Generic(_)));
        assert!(any.as_image_mut().is_none());
        assert_eq!(any.surface_type(), SurfaceType::Recording);

        match any.into_image().unwrap_err() {
            Error::SurfaceTypeMismatch { expected, found } => {
                assert_eq!(expected, SurfaceType::Image);
                assert_eq!(found, SurfaceType::Recording);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test_log::test]
    fn test_into_surface_keeps_reference() {
        let any = Surface::create_recording(Content::Alpha, None).unwrap();
        let surface = any.into_surface();
        assert_eq!(surface.reference_count(), 1);
        assert_eq!(surface.content(), Content::Alpha);
    }
}
