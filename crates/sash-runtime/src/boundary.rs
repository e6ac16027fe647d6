//! Helpers called from generated stubs at the native call boundary.

use std::panic;

/// Dereference a by-ref return value from native code.
///
/// A null pointer here means the native side broke its contract; there is
/// no host value to hand back, so this panics naming the entry point.
#[track_caller]
pub fn deref_native<'a, T>(ptr: *const T, symbol: &str) -> &'a T {
    if ptr.is_null() {
        null_reference(symbol);
    }
    // SAFETY: non-null and the native side guarantees the referent outlives
    // the object it was returned from.
    unsafe { &*ptr }
}

/// Mutable variant of [`deref_native`].
#[track_caller]
pub fn deref_native_mut<'a, T>(ptr: *mut T, symbol: &str) -> &'a mut T {
    if ptr.is_null() {
        null_reference(symbol);
    }
    // SAFETY: as in `deref_native`.
    unsafe { &mut *ptr }
}

#[cold]
#[track_caller]
fn null_reference(symbol: &str) -> ! {
    tracing::error!(symbol, "native entry point returned a null reference");
    panic!("native entry point '{symbol}' returned a null reference")
}

/// Finish a guarded stub: return the guarded value or continue unwinding.
///
/// Generated code runs its cleanup stages between `catch_unwind` and this
/// call, so cleanup happens exactly once on both paths.
pub fn finish<T>(result: std::thread::Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    }
}
