//! Sash proc macros.
//!
//! - `#[sash::api]` turns a trait describing a native API into a handle type
//!   whose methods call the native entry points.
//! - `#[sash::event_handler]` generates the single-active-handler glue for a
//!   host callback trait.
//!
//! Both report problems as compile errors on the offending item; nothing is
//! generated for a declaration that fails.

use proc_macro::TokenStream;

mod api;
mod attrs;
mod event_handler;
mod signature;

/// Project a native API declared as a trait.
///
/// # Attributes
///
/// - `name = "..."` - Native symbol prefix (default: the trait name)
/// - `component = 0x...` - Native component with this UID
/// - `extension = 0x...` - Native extension with this UID
/// - `compose(A, b::C)` - Forward the operations of other declarations
/// - `library = "..."` - Native library to link against
/// - `marshal(Type = Marshaller, ...)` - Convert `Type` with a custom marshaller
///
/// ## Method attributes
///
/// - `#[sash(native = "...")]` - Explicit native method name
/// - `#[sash(overload = "...")]` - Suffix distinguishing overloads
///
/// ## Parameter attributes
///
/// - `#[sash(out)]` - Write-only `&mut` parameter
///
/// # Example
///
/// ```ignore
/// #[sash::api(component = 0x8cfb3183976da208, compose(IEntity))]
/// pub trait IActor {
///     fn set_skin(&self, skin: i32);
///     #[sash(overload = "A")]
///     fn set_health(&self, health: f32);
///     fn get_name(&self, #[sash(out)] name: &mut String);
/// }
/// ```
#[proc_macro_attribute]
pub fn api(attr: TokenStream, item: TokenStream) -> TokenStream {
    api::api_impl(attr, item)
}

/// Generate event dispatch glue for a host callback trait.
///
/// The trait is kept. Next to it this emits `{Handler}Impl` (activation and
/// disposal of the single active handler) and `{Handler}Dispatcher` (the
/// native event dispatcher handle).
///
/// # Attributes
///
/// - `name = "..."` - Native handler name (default: trait name without a leading `I`)
/// - `library = "..."` - Native library to link against
///
/// # Example
///
/// ```ignore
/// #[sash::event_handler]
/// pub trait IVehicleEventHandler {
///     fn on_vehicle_spawn(&self, vehicle: Vehicle);
///     fn on_vehicle_death(&self, vehicle: Vehicle, killer: Player) -> bool;
/// }
/// ```
#[proc_macro_attribute]
pub fn event_handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    event_handler::event_handler_impl(attr, item)
}
