use std::collections::HashMap;

use bevy::prelude::*;
use bevy::tasks::{block_on, AsyncComputeTaskPool, Task};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_ASYNC_THRESHOLD;
use crate::connection::Connection;
use crate::events::{forward_report, PointValueChanged, PropagationTruncated};
use crate::network_manager::NetworkManager;
use crate::network_sets::NetworkSet;
use crate::recompute::RecomputeOutput;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Network tick, incremented once per `FixedUpdate`. Published results and
/// events carry the tick they were published on.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Host-tunable runtime settings.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Networks with at least this many members recompute on the
    /// `AsyncComputeTaskPool`; smaller ones recompute inline.
    pub async_threshold: usize,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            async_threshold: DEFAULT_ASYNC_THRESHOLD,
        }
    }
}

impl NetworkSettings {
    /// WASM has no worker threads, so everything runs inline there.
    pub fn should_offload(&self, member_count: usize) -> bool {
        !cfg!(target_arch = "wasm32") && member_count >= self.async_threshold
    }
}

/// Recompute tasks running on the async pool, at most one per connection.
/// Replacing or removing a task drops it, which cancels the job.
#[derive(Resource, Default)]
pub struct InFlightRecomputes {
    tasks: HashMap<Connection, Task<RecomputeOutput>>,
}

impl InFlightRecomputes {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, connection: &Connection) -> bool {
        self.tasks.contains_key(connection)
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn advance_tick(mut tick: ResMut<TickCounter>) {
    tick.0 = tick.0.wrapping_add(1);
}

/// Turn this tick's batched changes into recompute jobs.
///
/// Jobs for networks below the async threshold run inline and publish right
/// away. Larger ones are spawned on the `AsyncComputeTaskPool`; a new job
/// for a connection replaces (and so cancels) its in-flight task.
pub fn dispatch_recomputes(
    tick: Res<TickCounter>,
    settings: Res<NetworkSettings>,
    mut manager: ResMut<NetworkManager>,
    mut in_flight: ResMut<InFlightRecomputes>,
    mut changed: EventWriter<PointValueChanged>,
    mut truncated: EventWriter<PropagationTruncated>,
) {
    let jobs = manager.prepare_jobs(tick.0);

    // A batch that reverted its own in-flight changes leaves nothing to wait for.
    in_flight
        .tasks
        .retain(|connection, _| manager.is_in_flight(connection).unwrap_or(false));

    for job in jobs {
        if settings.should_offload(job.member_count()) {
            let connection = job.connection.clone();
            let task = AsyncComputeTaskPool::get().spawn(async move { job.run() });
            in_flight.tasks.insert(connection, task);
        } else {
            in_flight.tasks.remove(&job.connection);
            let output = job.run();
            if let Some(report) = manager.complete(output, tick.0) {
                forward_report(report, &mut changed, &mut truncated);
            }
        }
    }
}

/// Poll in-flight recompute tasks and publish the finished ones.
pub fn collect_recomputes(
    tick: Res<TickCounter>,
    mut manager: ResMut<NetworkManager>,
    mut in_flight: ResMut<InFlightRecomputes>,
    mut changed: EventWriter<PointValueChanged>,
    mut truncated: EventWriter<PropagationTruncated>,
) {
    if in_flight.tasks.is_empty() {
        return;
    }

    let mut finished = Vec::new();
    in_flight
        .tasks
        .retain(|_, task| match block_on(futures_lite::future::poll_once(task)) {
            Some(output) => {
                finished.push(output);
                false
            }
            None => true,
        });

    // HashMap order is arbitrary; publish in connection order.
    finished.sort_by(|a, b| a.connection.cmp(&b.connection));
    for output in finished {
        if let Some(report) = manager.complete(output, tick.0) {
            forward_report(report, &mut changed, &mut truncated);
        }
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct NetworkPlugin;

impl Plugin for NetworkPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TickCounter>()
            .init_resource::<NetworkManager>()
            .init_resource::<NetworkSettings>()
            .init_resource::<InFlightRecomputes>()
            .add_event::<PointValueChanged>()
            .add_event::<PropagationTruncated>()
            .configure_sets(
                FixedUpdate,
                (
                    NetworkSet::Tick,
                    NetworkSet::Propagate,
                    NetworkSet::Publish,
                )
                    .chain(),
            )
            .add_systems(
                FixedUpdate,
                (
                    advance_tick.in_set(NetworkSet::Tick),
                    dispatch_recomputes.in_set(NetworkSet::Propagate),
                    collect_recomputes.in_set(NetworkSet::Publish),
                ),
            );
    }
}
