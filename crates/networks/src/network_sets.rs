//! Ordering for the network systems in `FixedUpdate`.
//!
//! ```text
//! Tick  →  Propagate  →  Publish
//! ```
//!
//! * **Tick** – advances `TickCounter`.
//! * **Propagate** – turns the tick's batched membership and source changes
//!   into recompute jobs. Small networks run inline and publish immediately;
//!   large ones go to the `AsyncComputeTaskPool`.
//! * **Publish** – collects finished async jobs and publishes their results.
//!
//! Gameplay systems that call `add_point`, `remove_point` or `set_sources`
//! should run `.before(NetworkSet::Propagate)` so their changes are picked up
//! the same tick. Consumers of `PointValueChanged` run after `Publish`.

use bevy::prelude::*;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum NetworkSet {
    Tick,
    Propagate,
    Publish,
}
