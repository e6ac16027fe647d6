//! Runtime errors of the event dispatch protocol.

use thiserror::Error;

/// Errors raised by [`ActiveHandlerSlot`](crate::event::ActiveHandlerSlot).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// A different handler already occupies the slot.
    #[error("another handler for '{interface}' is already active")]
    HandlerAlreadyActive {
        /// The event interface the slot belongs to.
        interface: &'static str,
    },

    /// The handler is not the active one.
    #[error("handler for '{interface}' is not active")]
    NotActive { interface: &'static str },

    /// The handler is being disposed and accepts no new registrations.
    #[error("handler for '{interface}' is being disposed")]
    Disposing { interface: &'static str },
}

pub type EventResult<T> = Result<T, EventError>;
