//! Marshaller traits and the built-in marshallers.
//!
//! Generated stubs drive a marshaller through a fixed sequence of phases.
//! Host-to-native conversion goes through [`ToNative`], native-to-host
//! through [`FromNative`]. A type used for `&mut` (in and out) parameters
//! implements both with the same `Native` type.
//!
//! ```text
//! setup ─► marshal ─► pinned_marshal ─► [native call] ─► notify_invoked
//!                                                    └─► unmarshal_capture ─► unmarshal
//! cleanup_callee ─► cleanup_caller        (always, even when a later phase panicked)
//! ```

use crate::types::{BlittableBool, StringView};

/// Converts a host value into its native representation.
pub trait ToNative: Sized {
    /// Host type, as borrowed by [`marshal`](Self::marshal).
    type Managed: ?Sized;
    /// Native representation passed to the entry point.
    type Native: Copy + Default;

    /// Create the marshaller before any conversion happens.
    fn setup() -> Self;

    /// Convert (or stage) the host value.
    fn marshal(&mut self, value: &Self::Managed);

    /// Produce the native value. Whatever it points into stays fixed until
    /// [`cleanup_caller`](Self::cleanup_caller).
    fn pinned_marshal(&mut self) -> Self::Native;

    /// The native call returned normally.
    fn notify_invoked(&mut self) {}

    /// Release resources the caller allocated.
    fn cleanup_caller(&mut self) {}
}

/// Converts a native value back into its host representation.
pub trait FromNative: Sized {
    type Managed;
    type Native: Copy + Default;

    fn setup() -> Self;

    /// Take ownership of the raw native value right after the call.
    fn unmarshal_capture(&mut self, native: Self::Native);

    /// Build the host value from the captured native value.
    fn unmarshal(&mut self) -> Self::Managed;

    /// Release resources the callee handed over.
    fn cleanup_callee(&mut self) {}
}

// ============================================================================
// Booleans
// ============================================================================

/// `bool` ↔ [`BlittableBool`]. Stateless; generated code calls the
/// associated functions directly.
#[derive(Debug, Default)]
pub struct BoolMarshaller {
    native: BlittableBool,
}

impl BoolMarshaller {
    pub fn to_native(value: bool) -> BlittableBool {
        BlittableBool::from(value)
    }

    pub fn from_native(value: BlittableBool) -> bool {
        value.get()
    }
}

impl ToNative for BoolMarshaller {
    type Managed = bool;
    type Native = BlittableBool;

    fn setup() -> Self {
        Self::default()
    }

    fn marshal(&mut self, value: &bool) {
        self.native = Self::to_native(*value);
    }

    fn pinned_marshal(&mut self) -> BlittableBool {
        self.native
    }
}

impl FromNative for BoolMarshaller {
    type Managed = bool;
    type Native = BlittableBool;

    fn setup() -> Self {
        Self::default()
    }

    fn unmarshal_capture(&mut self, native: BlittableBool) {
        self.native = native;
    }

    fn unmarshal(&mut self) -> bool {
        Self::from_native(self.native)
    }
}

// ============================================================================
// Text
// ============================================================================

/// `&str` → [`StringView`] over the caller's buffer, and [`StringView`] →
/// `String` by copying out of native memory.
///
/// The view handed to native code borrows the host string directly; the
/// string cannot move while the stub holds the borrow, so the address the
/// native side sees is the one the host owns.
#[derive(Debug, Default)]
pub struct StringViewMarshaller {
    view: StringView,
}

impl StringViewMarshaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_managed(&mut self, text: &str) {
        self.view = StringView::new(text);
    }

    pub fn to_native(&self) -> StringView {
        self.view
    }

    /// Drop the staged view.
    pub fn free(&mut self) {
        self.view = StringView::EMPTY;
    }

    /// Copy a native view into an owned string.
    ///
    /// # Safety
    ///
    /// The view must describe readable memory for the duration of the call.
    pub unsafe fn to_managed(view: StringView) -> String {
        // SAFETY: upheld by the caller.
        unsafe { view.to_string_lossy() }
    }
}

impl ToNative for StringViewMarshaller {
    type Managed = str;
    type Native = StringView;

    fn setup() -> Self {
        Self::new()
    }

    fn marshal(&mut self, value: &str) {
        self.from_managed(value);
    }

    fn pinned_marshal(&mut self) -> StringView {
        self.to_native()
    }

    fn cleanup_caller(&mut self) {
        self.free();
    }
}

impl FromNative for StringViewMarshaller {
    type Managed = String;
    type Native = StringView;

    fn setup() -> Self {
        Self::new()
    }

    fn unmarshal_capture(&mut self, native: StringView) {
        self.view = native;
    }

    fn unmarshal(&mut self) -> String {
        // SAFETY: the view was just produced by the native call and the
        // native side keeps it alive until the stub returns.
        unsafe { Self::to_managed(self.view) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_marshaller_phases() {
        let mut to = <BoolMarshaller as ToNative>::setup();
        to.marshal(&true);
        assert_eq!(to.pinned_marshal(), BlittableBool::TRUE);

        let mut from = <BoolMarshaller as FromNative>::setup();
        from.unmarshal_capture(BlittableBool(2));
        assert!(from.unmarshal());
    }

    #[test]
    fn string_view_points_at_host_buffer() {
        let text = String::from("Widget");
        let mut marshaller = StringViewMarshaller::new();
        marshaller.from_managed(&text);

        let view = marshaller.to_native();
        assert_eq!(view.data, text.as_ptr());
        assert_eq!(view.len(), 6);

        marshaller.free();
        assert!(marshaller.to_native().is_empty());
    }

    #[test]
    fn string_view_round_trip_through_traits() {
        let mut to = <StringViewMarshaller as ToNative>::setup();
        to.marshal("abc");
        let native = to.pinned_marshal();

        let mut from = <StringViewMarshaller as FromNative>::setup();
        from.unmarshal_capture(native);
        assert_eq!(from.unmarshal(), "abc");

        to.cleanup_caller();
        assert!(to.pinned_marshal().is_empty());
    }
}
