//! cairo entry points that `cairo-sys-rs` does not declare.

use crate::ffi::{cairo_status_t, cairo_surface_t};
use libc::c_char;

unsafe extern "C" {
    pub fn cairo_surface_copy_page(surface: *mut cairo_surface_t);
    pub fn cairo_surface_show_page(surface: *mut cairo_surface_t);
    pub fn cairo_surface_write_to_png(
        surface: *mut cairo_surface_t,
        filename: *const c_char,
    ) -> cairo_status_t;
    pub fn cairo_image_surface_create_from_png(filename: *const c_char) -> *mut cairo_surface_t;
}
