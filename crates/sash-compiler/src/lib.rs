//! Code generation for sash.
//!
//! Turns the declaration model from `sash-core` into Rust items:
//!
//! - [`generate_api`]: handle types whose methods are native call stubs,
//!   sequenced by [`CallPlan`].
//! - [`generate_event_interface`]: the single-active-handler glue for a host
//!   callback trait.
//!
//! Generation is pure. Every error is reported before any tokens are
//! produced for the declaration it belongs to.

mod api;
mod config;
mod emit;
mod events;
pub mod naming;
mod sequencer;

pub use api::{generate_api, plan_methods};
pub use config::GeneratorConfig;
pub use events::generate_event_interface;
pub use naming::{EventSymbols, lower_camel, native_symbol};
pub use sequencer::CallPlan;

pub use sash_registry::Phase;
