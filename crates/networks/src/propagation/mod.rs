//! Propagation Engine: source values spread over a network with decay.
//!
//! Sources seed a FIFO frontier; each popped cell keeps the best value seen
//! so far and pushes `decay(value)` to its member neighbours. A full run
//! starts from an empty result; an incremental run resumes from the previous
//! result after additions. Both stop early at the policy's step or
//! iteration bound and report a [`Truncation`] alongside the partial result.

mod engine;
mod policy;
mod result;

pub use engine::PropagationEngine;
pub(crate) use policy::SourceDiff;
pub use policy::{Decay, PropagationPolicy, SourceSet};
pub use result::{PropagationOutcome, PropagationResult, Reach, Truncation, TruncationReason};
