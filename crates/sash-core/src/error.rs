//! Generation-time errors.
//!
//! Every error here is detected before any code is emitted for the
//! declaration it belongs to. A declaration either generates completely or
//! not at all; partial output would compile against the wrong ABI shape.
//!
//! ## Error Hierarchy
//!
//! ```text
//! GenerationError
//! ├── strategy resolution  - AmbiguousStrategy, DuplicateMarshaller, UnsupportedStrategy
//! ├── signature shape      - ByRefReturnRequiresMarshalling, UnsupportedReceiver
//! ├── declaration shape    - DuplicateMethod, ReservedMethodName, DuplicateCapability,
//! │                          InvalidDeclaration
//! ├── event interfaces     - UnsupportedCallback
//! └── type syntax          - InvalidType
//! ```

use thiserror::Error;

/// Errors raised while turning declarations into call-boundary code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// More than one registered predicate matched a type.
    #[error("ambiguous marshaller for type '{ty}': matched {}", candidates.join(", "))]
    AmbiguousStrategy {
        /// The type being resolved.
        ty: String,
        /// Names of every predicate that matched.
        candidates: Vec<String>,
    },

    /// The same predicate was registered twice.
    #[error("marshaller predicate '{predicate}' is already registered")]
    DuplicateMarshaller {
        /// The predicate name.
        predicate: String,
    },

    /// A strategy exists for the type but cannot be used in this position.
    #[error("type '{ty}' cannot be marshalled {position}")]
    UnsupportedStrategy {
        /// The type.
        ty: String,
        /// Where it was used (e.g. "as a by-ref callback parameter").
        position: String,
    },

    /// A by-ref return was declared for a type that needs conversion.
    #[error(
        "method '{method}' returns '{ty}' by reference, but '{ty}' requires marshalling; \
         by-ref returns are only supported for native-compatible types"
    )]
    ByRefReturnRequiresMarshalling {
        /// The method name.
        method: String,
        /// The return type.
        ty: String,
    },

    /// Methods must take `&self`.
    #[error("method '{method}' must take `&self` as its receiver")]
    UnsupportedReceiver {
        /// The method name.
        method: String,
    },

    /// A method was declared twice in one declaration.
    #[error("method '{method}' is declared more than once in '{declaration}'")]
    DuplicateMethod {
        /// The declaration name.
        declaration: String,
        /// The duplicated method name.
        method: String,
    },

    /// A method name that the generated handle type already defines.
    #[error(
        "method '{method}' in '{declaration}' collides with the generated handle accessor \
         of the same name"
    )]
    ReservedMethodName {
        /// The declaration name.
        declaration: String,
        /// The reserved method name.
        method: String,
    },

    /// A capability was composed twice.
    #[error("capability '{capability}' is composed more than once into '{declaration}'")]
    DuplicateCapability {
        /// The declaration name.
        declaration: String,
        /// The duplicated capability.
        capability: String,
    },

    /// A callback signature the event adapter cannot express.
    #[error("callback '{interface}::{method}' is not supported: {reason}")]
    UnsupportedCallback {
        /// The event interface name.
        interface: String,
        /// The callback method.
        method: String,
        /// Why it is rejected.
        reason: String,
    },

    /// The declaration as a whole is malformed.
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// A type path could not be parsed.
    #[error("invalid type: {0}")]
    InvalidType(String),
}

/// Result alias for generation.
pub type GenerationResult<T> = Result<T, GenerationError>;

impl GenerationError {
    /// The method this error is attached to, when it is method-scoped.
    ///
    /// Front-ends use this to point diagnostics at the offending method
    /// instead of the whole declaration.
    pub fn method(&self) -> Option<&str> {
        match self {
            GenerationError::ByRefReturnRequiresMarshalling { method, .. }
            | GenerationError::UnsupportedReceiver { method }
            | GenerationError::DuplicateMethod { method, .. }
            | GenerationError::ReservedMethodName { method, .. }
            | GenerationError::UnsupportedCallback { method, .. } => Some(method),
            _ => None,
        }
    }
}
