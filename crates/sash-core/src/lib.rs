//! Declaration model for the sash call-boundary generator.
//!
//! This crate holds what the generator reads (declarations, host types,
//! pass and return modifiers) and what it can fail with
//! ([`GenerationError`]). It has no knowledge of token streams; the
//! registry and compiler crates build on top of it.

mod declaration;
mod error;
mod qualified_name;
mod types;

pub use declaration::{
    default_handler_name, ApiDeclaration, ComposedCapability, EventInterfaceDeclaration,
    MarshallerBinding, MethodSignature, Parameter,
};
pub use error::{GenerationError, GenerationResult};
pub use qualified_name::QualifiedName;
pub use types::{PassModifier, PrimitiveKind, ReturnModifier, TypeRef};
