//! Domain model types: raw usage telemetry, derived aggregates, and the
//! structured documents produced by the inference and fallback paths.

mod prediction;
mod recommendation;
mod usage;

pub use prediction::*;
pub use recommendation::*;
pub use usage::*;
