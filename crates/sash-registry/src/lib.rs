//! Marshaller strategy registry for sash.
//!
//! Maps host types to [`MarshallerStrategy`] values and describes, per
//! strategy, which phases of a call stub it contributes and what code runs
//! in each of them.

mod registry;
mod strategy;

pub use registry::{MarshallerRegistry, TypePredicate};
pub use strategy::{CustomMarshaller, Direction, MarshalSite, MarshallerStrategy, Phase, PhaseSet};
