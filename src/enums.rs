//! Value types exchanged with cairo.
//!
//! cairo passes its enumerations as plain `int`s. Every value read back
//! from the library goes through `from_raw`/`TryFrom`, so a code this crate
//! does not know is kept or rejected, never reinterpreted.

use libc::c_int;
use serde::{Deserialize, Serialize};
use std::ffi::CStr;
use std::fmt;

/// Outcome code of a cairo call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Status {
    Success,
    NoMemory,
    InvalidMatrix,
    InvalidStatus,
    NullPointer,
    InvalidString,
    ReadError,
    WriteError,
    SurfaceFinished,
    SurfaceTypeMismatch,
    InvalidContent,
    InvalidFormat,
    FileNotFound,
    InvalidStride,
    InvalidSize,
    DeviceError,
    PngError,
    /// A code with no named variant.
    Other(c_int),
}

impl Status {
    pub fn from_raw(code: c_int) -> Self {
        match code {
            0 => Status::Success,
            1 => Status::NoMemory,
            5 => Status::InvalidMatrix,
            6 => Status::InvalidStatus,
            7 => Status::NullPointer,
            8 => Status::InvalidString,
            10 => Status::ReadError,
            11 => Status::WriteError,
            12 => Status::SurfaceFinished,
            13 => Status::SurfaceTypeMismatch,
            15 => Status::InvalidContent,
            16 => Status::InvalidFormat,
            18 => Status::FileNotFound,
            24 => Status::InvalidStride,
            32 => Status::InvalidSize,
            35 => Status::DeviceError,
            39 => Status::PngError,
            other => Status::Other(other),
        }
    }

    pub fn into_raw(self) -> c_int {
        match self {
            Status::Success => 0,
            Status::NoMemory => 1,
            Status::InvalidMatrix => 5,
            Status::InvalidStatus => 6,
            Status::NullPointer => 7,
            Status::InvalidString => 8,
            Status::ReadError => 10,
            Status::WriteError => 11,
            Status::SurfaceFinished => 12,
            Status::SurfaceTypeMismatch => 13,
            Status::InvalidContent => 15,
            Status::InvalidFormat => 16,
            Status::FileNotFound => 18,
            Status::InvalidStride => 24,
            Status::InvalidSize => 32,
            Status::DeviceError => 35,
            Status::PngError => 39,
            Status::Other(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

/// cairo's own description of the status.
impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = unsafe { cairo_sys::cairo_status_to_string(self.into_raw()) };
        if text.is_null() {
            return write!(f, "status {}", self.into_raw());
        }
        f.write_str(&unsafe { CStr::from_ptr(text) }.to_string_lossy())
    }
}

/// Pixel layout of an image surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Invalid,
    Argb32,
    Rgb24,
    A8,
    A1,
    Rgb16_565,
    Rgb30,
    Rgb96f,
    Rgba128f,
}

impl Format {
    pub fn into_raw(self) -> c_int {
        match self {
            Format::Invalid => -1,
            Format::Argb32 => 0,
            Format::Rgb24 => 1,
            Format::A8 => 2,
            Format::A1 => 3,
            Format::Rgb16_565 => 4,
            Format::Rgb30 => 5,
            Format::Rgb96f => 6,
            Format::Rgba128f => 7,
        }
    }
}

impl TryFrom<c_int> for Format {
    type Error = Status;

    fn try_from(value: c_int) -> Result<Self, Status> {
        Ok(match value {
            0 => Format::Argb32,
            1 => Format::Rgb24,
            2 => Format::A8,
            3 => Format::A1,
            4 => Format::Rgb16_565,
            5 => Format::Rgb30,
            6 => Format::Rgb96f,
            7 => Format::Rgba128f,
            _ => return Err(Status::InvalidFormat),
        })
    }
}

/// What a surface stores: color, alpha or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Color,
    Alpha,
    ColorAlpha,
}

impl Content {
    pub fn into_raw(self) -> c_int {
        match self {
            Content::Color => 0x1000,
            Content::Alpha => 0x2000,
            Content::ColorAlpha => 0x3000,
        }
    }
}

impl TryFrom<c_int> for Content {
    type Error = Status;

    fn try_from(value: c_int) -> Result<Self, Status> {
        match value {
            0x1000 => Ok(Content::Color),
            0x2000 => Ok(Content::Alpha),
            0x3000 => Ok(Content::ColorAlpha),
            _ => Err(Status::InvalidContent),
        }
    }
}

/// Backend type tag of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    Image,
    Pdf,
    Ps,
    Xlib,
    Xcb,
    Glitz,
    Quartz,
    Win32,
    BeOs,
    DirectFb,
    Svg,
    Os2,
    Win32Printing,
    QuartzImage,
    Script,
    Qt,
    Recording,
    Vg,
    Gl,
    Drm,
    Tee,
    Xml,
    Skia,
    Subsurface,
    Cogl,
    /// A tag newer than this crate.
    Other(c_int),
}

const SURFACE_TYPES: [SurfaceType; 25] = [
    SurfaceType::Image,
    SurfaceType::Pdf,
    SurfaceType::Ps,
    SurfaceType::Xlib,
    SurfaceType::Xcb,
    SurfaceType::Glitz,
    SurfaceType::Quartz,
    SurfaceType::Win32,
    SurfaceType::BeOs,
    SurfaceType::DirectFb,
    SurfaceType::Svg,
    SurfaceType::Os2,
    SurfaceType::Win32Printing,
    SurfaceType::QuartzImage,
    SurfaceType::Script,
    SurfaceType::Qt,
    SurfaceType::Recording,
    SurfaceType::Vg,
    SurfaceType::Gl,
    SurfaceType::Drm,
    SurfaceType::Tee,
    SurfaceType::Xml,
    SurfaceType::Skia,
    SurfaceType::Subsurface,
    SurfaceType::Cogl,
];

impl SurfaceType {
    pub fn from_raw(tag: c_int) -> Self {
        usize::try_from(tag)
            .ok()
            .and_then(|index| SURFACE_TYPES.get(index).copied())
            .unwrap_or(SurfaceType::Other(tag))
    }

    pub fn into_raw(self) -> c_int {
        match self {
            SurfaceType::Other(tag) => tag,
            known => SURFACE_TYPES
                .iter()
                .position(|candidate| *candidate == known)
                .map_or(-1, |index| index as c_int),
        }
    }
}

/// A rectangle in user-space units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<Rectangle> for cairo_sys::cairo_rectangle_t {
    fn from(rect: Rectangle) -> Self {
        cairo_sys::cairo_rectangle_t {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

impl From<cairo_sys::cairo_rectangle_t> for Rectangle {
    fn from(rect: cairo_sys::cairo_rectangle_t) -> Self {
        Rectangle {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}
