//! Runtime support for code generated by sash.
//!
//! Generated API types, marshalling stubs and event trampolines call into
//! this crate. It is re-exported through the `sash` facade, and generated
//! code names everything by its `::sash::` path.

pub mod boundary;
mod error;
pub mod event;
mod handle;
pub mod marshal;
mod object;
mod types;

pub use error::{EventError, EventResult};
pub use event::{ActiveHandlerSlot, DisposeHook, ScopedHandler};
pub use handle::NativeHandle;
pub use marshal::{BoolMarshaller, FromNative, StringViewMarshaller, ToNative};
pub use object::{ApiObject, Component, Extension};
pub use types::{BlittableBool, EventPriority, Size, StringView, Uid};
