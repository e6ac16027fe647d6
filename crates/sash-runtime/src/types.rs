//! Native-compatible value types.
//!
//! These are the native representations built-in marshallers convert to and
//! from. All of them are `Copy + Default`, so generated code can
//! default-initialize its native locals before marshalling.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

// ============================================================================
// Booleans
// ============================================================================

/// One-byte boolean as the native side sees it (`0` false, anything else true).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlittableBool(pub u8);

impl BlittableBool {
    pub const FALSE: BlittableBool = BlittableBool(0);
    pub const TRUE: BlittableBool = BlittableBool(1);

    pub fn get(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for BlittableBool {
    fn from(value: bool) -> Self {
        if value { Self::TRUE } else { Self::FALSE }
    }
}

impl From<BlittableBool> for bool {
    fn from(value: BlittableBool) -> Self {
        value.get()
    }
}

// ============================================================================
// Sizes and identifiers
// ============================================================================

/// Native `size_t`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Size(pub usize);

impl From<usize> for Size {
    fn from(value: usize) -> Self {
        Size(value)
    }
}

impl From<Size> for usize {
    fn from(value: Size) -> Self {
        value.0
    }
}

/// 64-bit identifier of a component or extension.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Uid(pub u64);

impl Uid {
    pub const fn new(value: u64) -> Self {
        Uid(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({:016x})", self.0)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// ============================================================================
// Text views
// ============================================================================

/// Borrowed UTF-8 text as `(pointer, length)`.
///
/// The view does not own its bytes. When produced by
/// [`StringViewMarshaller`](crate::marshal::StringViewMarshaller) the buffer
/// is pinned by the marshaller for the duration of the native call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringView {
    pub data: *const u8,
    pub len: Size,
}

impl StringView {
    pub const EMPTY: StringView = StringView {
        data: std::ptr::null(),
        len: Size(0),
    };

    /// View over a string; the caller keeps `text` alive while the view is used.
    pub fn new(text: &str) -> Self {
        Self {
            data: text.as_ptr(),
            len: Size(text.len()),
        }
    }

    pub fn len(&self) -> usize {
        self.len.0
    }

    pub fn is_empty(&self) -> bool {
        self.len.0 == 0
    }

    /// # Safety
    ///
    /// `data` must point to `len` readable bytes that stay valid for `'a`.
    pub unsafe fn as_bytes<'a>(&self) -> &'a [u8] {
        if self.data.is_null() || self.len.0 == 0 {
            return &[];
        }
        // SAFETY: upheld by the caller.
        unsafe { std::slice::from_raw_parts(self.data, self.len.0) }
    }

    /// Copy the viewed text into an owned string, replacing invalid UTF-8.
    ///
    /// # Safety
    ///
    /// Same as [`as_bytes`](Self::as_bytes).
    pub unsafe fn to_string_lossy(&self) -> String {
        // SAFETY: upheld by the caller.
        String::from_utf8_lossy(unsafe { self.as_bytes() }).into_owned()
    }
}

impl Default for StringView {
    fn default() -> Self {
        Self::EMPTY
    }
}

// ============================================================================
// Event priority
// ============================================================================

/// Ordering of event handlers on a native dispatcher; lower runs first.
#[repr(i8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, IntoPrimitive, TryFromPrimitive,
)]
pub enum EventPriority {
    Highest = -128,
    FairlyHigh = -64,
    #[default]
    Default = 0,
    FairlyLow = 64,
    Lowest = 127,
}

impl EventPriority {
    /// Priority from a raw native value.
    ///
    /// Native dispatchers may report priorities between the named levels;
    /// those are rounded to the nearest named level.
    pub fn from_native(value: i8) -> Self {
        if let Ok(priority) = EventPriority::try_from(value) {
            return priority;
        }
        match value {
            i8::MIN..=-97 => EventPriority::Highest,
            -96..=-33 => EventPriority::FairlyHigh,
            -32..=31 => EventPriority::Default,
            32..=95 => EventPriority::FairlyLow,
            _ => EventPriority::Lowest,
        }
    }

    pub fn to_native(self) -> i8 {
        self.into()
    }
}
