//! Call-boundary generation for native plugin APIs.
//!
//! Declare a native API as a trait and let `#[sash::api]` generate the
//! handle type and its marshalling stubs; declare a host callback trait with
//! `#[sash::event_handler]` to receive native events through a single active
//! handler.
//!
//! ```ignore
//! #[sash::api(component = 0x8cfb3183976da208)]
//! pub trait IVehiclesComponent {
//!     fn count(&self) -> usize;
//!     fn set_plate(&self, id: i32, plate: &str) -> bool;
//! }
//!
//! #[sash::event_handler]
//! pub trait IVehicleEventHandler {
//!     fn on_vehicle_spawn(&self, vehicle: Vehicle);
//! }
//! ```
//!
//! Generated code refers to this crate as `::sash`; everything it needs at
//! runtime is re-exported here from `sash-runtime`.

pub use sash_macros::{api, event_handler};
pub use sash_runtime::*;

/// The generator itself, for build scripts and other front-ends that build
/// declarations without the attribute macros.
pub mod codegen {
    pub use sash_compiler::*;
    pub use sash_core::*;
    pub use sash_registry::{MarshallerRegistry, MarshallerStrategy, PhaseSet, TypePredicate};
}

pub mod prelude {
    pub use sash_runtime::{ApiObject, Component, EventPriority, Extension, NativeHandle};
}
