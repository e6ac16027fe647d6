use crate::handle::NativeHandle;
use crate::types::Uid;

/// A host value that is nothing more than a handle to a native object.
///
/// Implemented by every type generated from an API declaration.
pub trait ApiObject: Copy {
    fn handle(&self) -> NativeHandle;

    fn from_handle(handle: NativeHandle) -> Self;

    /// True when the wrapped handle is null.
    fn is_null(&self) -> bool {
        self.handle().is_null()
    }

    /// Reinterpret as another API type over the same native object.
    fn cast<T: ApiObject>(&self) -> T {
        T::from_handle(self.handle())
    }
}

/// A native component, looked up by its UID.
pub trait Component: ApiObject {
    const UID: Uid;
}

/// A native extension, attached to other objects and looked up by its UID.
pub trait Extension: ApiObject {
    const UID: Uid;
}
