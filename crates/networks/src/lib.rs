//! Utility connection networks on a 2D tile grid.
//!
//! Tiles join named networks ("water", "power", ...) through the
//! [`NetworkManager`]. Each network owns a [`Passer`] that propagates source
//! values over the member cells with a configurable decay and tells
//! subscribers which cells changed. [`NetworkPlugin`] runs the whole thing on
//! Bevy's `FixedUpdate`, batching every tick's changes into one recompute per
//! network and moving large recomputes onto the async task pool.

pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod grid_index;
pub mod network_graph;
pub mod network_manager;
pub mod network_sets;
pub mod passer;
pub mod plugin;
pub mod point;
pub mod propagation;
pub mod recompute;
pub mod snapshot;
pub mod stats;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
pub mod test_harness;

pub use connection::Connection;
pub use error::NetworkError;
pub use events::{PointValueChanged, PropagationTruncated};
pub use grid_index::{GridIndex, TopologyChange, TopologyDelta};
pub use network_graph::{Adjacency, NetworkGraph};
pub use network_manager::{NetworkManager, RecomputeReport};
pub use network_sets::NetworkSet;
pub use passer::{Passer, SubscriptionToken, ValueCallback, ValueChange};
pub use plugin::{InFlightRecomputes, NetworkPlugin, NetworkSettings, TickCounter};
pub use point::Point;
pub use propagation::{
    Decay, PropagationEngine, PropagationOutcome, PropagationPolicy, PropagationResult,
    SourceSet, Truncation, TruncationReason,
};
pub use recompute::{RecomputeJob, RecomputeMode, RecomputeOutput};
pub use snapshot::{MembershipSnapshot, NetworkMembers};
pub use stats::NetworkStats;
