use std::ffi::c_void;
use std::fmt;

/// Opaque pointer to a native object.
///
/// Generated API types wrap exactly one of these; the native side owns the
/// object it points to. The handle itself is a plain token and carries no
/// ownership, so copying it is always fine.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(*mut c_void);

// The handle is an address token; which threads may use the object behind it
// is part of the native host's contract.
unsafe impl Send for NativeHandle {}
unsafe impl Sync for NativeHandle {}

impl NativeHandle {
    pub const NULL: NativeHandle = NativeHandle(std::ptr::null_mut());

    pub const fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    /// Handle from a raw address. Mostly useful for tests and fakes.
    pub fn from_addr(addr: usize) -> Self {
        Self(addr as *mut c_void)
    }

    pub const fn as_ptr(self) -> *mut c_void {
        self.0
    }

    pub fn addr(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for NativeHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({:#x})", self.addr())
    }
}
