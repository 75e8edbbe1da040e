//! Lifetime extension for host objects handed to the native library.
//!
//! Native calls such as `cairo_surface_set_mime_data` keep a raw pointer
//! into host memory and announce, through a destroy notification, when they
//! stop using it. [`KeepAlive`] parks the owning objects in a process-wide
//! live set until that notification arrives.
//!
//! # Invariant
//!
//! An entry leaves the live set only in [`release`], i.e. when the native
//! library says it is done with it, or through [`KeepAlive::cancel`] when
//! the native call that would have taken it failed.

use libc::c_void;
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Destroy notification in the shape cairo expects.
pub type DestroyFunc = unsafe extern "C" fn(*mut c_void);

type LiveSet = HashMap<usize, Box<dyn Any + Send>>;

static LIVE: Lazy<Mutex<LiveSet>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Keys start at 1 so a closure is never NULL.
static NEXT_KEY: AtomicUsize = AtomicUsize::new(1);

fn live() -> MutexGuard<'static, LiveSet> {
    LIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registration of host objects in the live set.
///
/// Dropping a `KeepAlive` does not unpin anything: the entry belongs to the
/// native library as soon as [`KeepAlive::closure`] has been passed on.
#[derive(Debug)]
#[must_use = "the closure must be handed to the native call"]
pub struct KeepAlive {
    key: usize,
}

impl KeepAlive {
    /// Pin `objects` until the native library releases them.
    pub fn pin<T: Send + 'static>(objects: T) -> Self {
        let key = NEXT_KEY.fetch_add(1, Ordering::Relaxed);
        live().insert(key, Box::new(objects));
        #[cfg(test)]
        LAST_PINNED.with(|last| last.set(key));
        debug!("pinned host objects under key {key}");
        Self { key }
    }

    /// The destroy notification and closure pair expected by native calls
    /// that retain data.
    pub fn closure(&self) -> (DestroyFunc, *mut c_void) {
        (release, self.key as *mut c_void)
    }

    /// Unpin after the native call refused the data.
    pub(crate) fn cancel(self) {
        let entry = live().remove(&self.key);
        debug!("cancelled pin {}", self.key);
        drop(entry);
    }
}

#[cfg(test)]
thread_local! {
    static LAST_PINNED: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Key of the most recent pin made on this thread.
#[cfg(test)]
pub(crate) fn last_pinned() -> usize {
    LAST_PINNED.with(|last| last.get())
}

#[cfg(test)]
pub(crate) fn is_pinned(key: usize) -> bool {
    live().contains_key(&key)
}

/// Destroy notification passed to the native library.
///
/// The entry is dropped after the lock is released: dropping host objects
/// may run arbitrary code, including native calls that release other pins.
unsafe extern "C" fn release(closure: *mut c_void) {
    let key = closure as usize;
    let entry = live().remove(&key);
    match entry {
        Some(objects) => {
            debug!("native library released pin {key}");
            drop(objects);
        }
        None => warn!("release for unknown pin {key}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test_log::test]
    fn test_pin_until_release() {
        let data = Arc::new(vec![1u8, 2, 3]);
        let pin = KeepAlive::pin(Arc::clone(&data));
        assert_eq!(Arc::strong_count(&data), 2);

        let (destroy, closure) = pin.closure();
        assert!(!closure.is_null());
        assert_eq!(last_pinned(), closure as usize);
        drop(pin);
        // Dropping the registration keeps the objects alive.
        assert_eq!(Arc::strong_count(&data), 2);
        assert!(is_pinned(closure as usize));

        unsafe { destroy(closure) };
        assert_eq!(Arc::strong_count(&data), 1);
        assert!(!is_pinned(closure as usize));
    }

    #[test_log::test]
    fn test_cancel() {
        let data = Arc::new(());
        let pin = KeepAlive::pin((Arc::clone(&data), String::from("image/png")));
        let key = last_pinned();
        pin.cancel();
        assert!(!is_pinned(key));
        assert_eq!(Arc::strong_count(&data), 1);
    }

    #[test_log::test]
    fn test_unknown_release_is_ignored() {
        let pin = KeepAlive::pin(0u8);
        let (destroy, closure) = pin.closure();
        unsafe {
            destroy(closure);
            destroy(closure);
        }
    }

    #[test_log::test]
    fn test_release_reentry() {
        // Dropping a pinned object may release another pin.
        struct ReleaseOnDrop(usize);
        impl Drop for ReleaseOnDrop {
            fn drop(&mut self) {
                unsafe { release(self.0 as *mut c_void) };
            }
        }

        let inner = Arc::new(());
        let inner_pin = KeepAlive::pin(Arc::clone(&inner));
        let (_, inner_closure) = inner_pin.closure();
        let outer_pin = KeepAlive::pin(ReleaseOnDrop(inner_closure as usize));
        let (destroy, outer_closure) = outer_pin.closure();

        unsafe { destroy(outer_closure) };
        assert_eq!(Arc::strong_count(&inner), 1);
    }
}
