//! Network Manager: the single owner of network membership.
//!
//! Tile and building code mutates membership and supplies sources through
//! the manager; each configured connection has one [`Passer`] that publishes
//! value changes. Mutations within a tick are batched per connection and
//! turned into at most one recompute job per connection when the tick is
//! flushed.
//!
//! Recompute can be split in two halves so it can run on a worker:
//! [`NetworkManager::prepare_jobs`] snapshots the pending work, and
//! [`NetworkManager::complete`] publishes a finished job. A job whose
//! connection was mutated again before it finished is superseded: the next
//! `prepare_jobs` restarts it with the merged changes and the stale result
//! is discarded on arrival.

mod pending;

use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::*;

use crate::connection::Connection;
use crate::error::NetworkError;
use crate::grid_index::GridIndex;
use crate::passer::{Passer, SubscriptionToken, ValueChange};
use crate::point::Point;
use crate::propagation::{
    PropagationOutcome, PropagationPolicy, PropagationResult, SourceDiff, SourceSet, Truncation,
    TruncationReason,
};
use crate::recompute::{RecomputeJob, RecomputeMode, RecomputeOutput};
use crate::snapshot::{MembershipSnapshot, NetworkMembers};
use crate::stats::NetworkStats;

use pending::PendingDelta;

/// What one published recompute changed.
#[derive(Debug, Clone)]
pub struct RecomputeReport {
    pub connection: Connection,
    pub tick: u64,
    pub full: bool,
    pub changes: Vec<ValueChange>,
    pub truncation: Option<Truncation>,
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    delta: PendingDelta,
}

#[derive(Debug)]
struct NetworkEntry {
    passer: Passer,
    pending: PendingDelta,
    in_flight: Option<InFlight>,
    generation: u64,
    stats: NetworkStats,
    /// The published result stopped at the iteration bound, so its frontier
    /// was never drained and it cannot seed an incremental run.
    partial_base: bool,
}

impl NetworkEntry {
    fn new(passer: Passer) -> Self {
        Self {
            passer,
            pending: PendingDelta::default(),
            in_flight: None,
            generation: 0,
            stats: NetworkStats::default(),
            partial_base: false,
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct NetworkManager {
    index: GridIndex,
    networks: BTreeMap<Connection, NetworkEntry>,
}

impl NetworkManager {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Configure `connection` with a fresh passer using `policy`.
    pub fn configure(
        &mut self,
        connection: Connection,
        policy: PropagationPolicy,
    ) -> Result<(), NetworkError> {
        self.register_passer(Passer::new(connection, policy))
    }

    /// Register a prepared passer (e.g. one that already has subscribers).
    pub fn register_passer(&mut self, passer: Passer) -> Result<(), NetworkError> {
        let connection = passer.connection().clone();
        if self.networks.contains_key(&connection) {
            return Err(NetworkError::DuplicatePasser(connection));
        }
        let mut entry = NetworkEntry::new(passer);
        entry.stats.member_count = self.index.len(&connection);
        entry.pending.force_full = entry.stats.member_count > 0;
        self.networks.insert(connection, entry);
        Ok(())
    }

    pub fn is_configured(&self, connection: &Connection) -> bool {
        self.networks.contains_key(connection)
    }

    /// Configured connections in name order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.networks.keys()
    }

    fn entry(&self, connection: &Connection) -> Result<&NetworkEntry, NetworkError> {
        self.networks
            .get(connection)
            .ok_or_else(|| NetworkError::UnknownConnection(connection.clone()))
    }

    fn entry_mut(&mut self, connection: &Connection) -> Result<&mut NetworkEntry, NetworkError> {
        self.networks
            .get_mut(connection)
            .ok_or_else(|| NetworkError::UnknownConnection(connection.clone()))
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Returns `Ok(false)` if the point was already a member.
    pub fn add_point(&mut self, connection: &Connection, point: Point) -> Result<bool, NetworkError> {
        let entry = self
            .networks
            .get_mut(connection)
            .ok_or_else(|| NetworkError::UnknownConnection(connection.clone()))?;
        let Some(delta) = self.index.add_point(connection, point) else {
            return Ok(false);
        };
        entry.pending.record(&delta);
        entry.stats.member_count = self.index.len(connection);
        Ok(true)
    }

    /// Returns `Ok(false)` if the point was not a member.
    pub fn remove_point(
        &mut self,
        connection: &Connection,
        point: Point,
    ) -> Result<bool, NetworkError> {
        let entry = self
            .networks
            .get_mut(connection)
            .ok_or_else(|| NetworkError::UnknownConnection(connection.clone()))?;
        let Some(delta) = self.index.remove_point(connection, point) else {
            return Ok(false);
        };
        entry.pending.record(&delta);
        entry.stats.member_count = self.index.len(connection);
        Ok(true)
    }

    pub fn has_point(&self, connection: &Connection, point: Point) -> Result<bool, NetworkError> {
        self.entry(connection)?;
        Ok(self.index.has_point(connection, point))
    }

    pub fn points(&self, connection: &Connection) -> Result<BTreeSet<Point>, NetworkError> {
        self.entry(connection)?;
        Ok(self.index.points(connection))
    }

    /// Member neighbours of `point` under the connection's adjacency policy.
    pub fn neighbors(
        &self,
        connection: &Connection,
        point: Point,
    ) -> Result<Vec<Point>, NetworkError> {
        let entry = self.entry(connection)?;
        let graph = self.index.graph(connection, entry.passer.policy().adjacency);
        Ok(graph.neighbors(point).collect())
    }

    /// Read-only view of all membership.
    pub fn index(&self) -> &GridIndex {
        &self.index
    }

    // -----------------------------------------------------------------------
    // Sources and policy
    // -----------------------------------------------------------------------

    /// Replace the source set used from the next recompute on. Setting an
    /// identical set schedules nothing.
    pub fn set_sources(
        &mut self,
        connection: &Connection,
        sources: SourceSet,
    ) -> Result<(), NetworkError> {
        self.entry_mut(connection)?.pending.sources = Some(sources);
        Ok(())
    }

    /// Sources behind the last published result.
    pub fn sources(&self, connection: &Connection) -> Result<&SourceSet, NetworkError> {
        Ok(self.entry(connection)?.passer.sources())
    }

    pub fn set_policy(
        &mut self,
        connection: &Connection,
        policy: PropagationPolicy,
    ) -> Result<(), NetworkError> {
        let entry = self.entry_mut(connection)?;
        entry.passer.set_policy(policy);
        entry.pending.force_full = true;
        Ok(())
    }

    pub fn request_full_recompute(&mut self, connection: &Connection) -> Result<(), NetworkError> {
        self.entry_mut(connection)?.pending.force_full = true;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Subscriptions and published values
    // -----------------------------------------------------------------------

    pub fn subscribe(
        &mut self,
        connection: &Connection,
        callback: impl FnMut(Point, f32) + Send + Sync + 'static,
    ) -> Result<SubscriptionToken, NetworkError> {
        Ok(self.entry_mut(connection)?.passer.subscribe(callback))
    }

    /// Returns false if the token is unknown or already unsubscribed.
    pub fn unsubscribe(&mut self, token: &SubscriptionToken) -> bool {
        self.networks
            .get_mut(&token.connection)
            .is_some_and(|entry| entry.passer.unsubscribe(token))
    }

    pub fn passer(&self, connection: &Connection) -> Result<&Passer, NetworkError> {
        Ok(&self.entry(connection)?.passer)
    }

    pub fn value(&self, connection: &Connection, point: Point) -> Result<Option<f32>, NetworkError> {
        Ok(self.entry(connection)?.passer.value(point))
    }

    pub fn result(&self, connection: &Connection) -> Result<&PropagationResult, NetworkError> {
        Ok(self.entry(connection)?.passer.result())
    }

    pub fn stats(&self, connection: &Connection) -> Result<&NetworkStats, NetworkError> {
        Ok(&self.entry(connection)?.stats)
    }

    // -----------------------------------------------------------------------
    // Recompute
    // -----------------------------------------------------------------------

    /// True if the connection has changes not yet handed to a job.
    pub fn is_dirty(&self, connection: &Connection) -> Result<bool, NetworkError> {
        Ok(!self.entry(connection)?.pending.is_empty())
    }

    pub fn is_in_flight(&self, connection: &Connection) -> Result<bool, NetworkError> {
        Ok(self.entry(connection)?.in_flight.is_some())
    }

    /// True if any connection has pending changes or an unfinished job.
    pub fn has_pending_work(&self) -> bool {
        self.networks
            .values()
            .any(|e| !e.pending.is_empty() || e.in_flight.is_some())
    }

    /// Turn every connection's batched changes into a recompute job.
    ///
    /// A connection whose previous job is still in flight gets a replacement
    /// job covering both the in-flight and the new changes; the old job's
    /// result will be rejected by [`complete`](Self::complete).
    pub fn prepare_jobs(&mut self, tick: u64) -> Vec<RecomputeJob> {
        let mut jobs = Vec::new();

        for (connection, entry) in self.networks.iter_mut() {
            if entry.pending.is_empty() {
                continue;
            }
            let pending = std::mem::take(&mut entry.pending);
            let delta = match entry.in_flight.take() {
                Some(flight) => {
                    entry.stats.cancelled_recomputes += 1;
                    debug!(
                        "Network '{}': superseding in-flight recompute {} at tick {}",
                        connection, flight.generation, tick
                    );
                    flight.delta.merge(pending)
                }
                None => pending,
            };

            let policy = *entry.passer.policy();
            let published = entry.passer.sources();
            let sources = delta.sources.clone().unwrap_or_else(|| published.clone());
            let source_diff = published.diff(&sources, &policy);

            let mode = if delta.force_full
                || entry.partial_base
                || !delta.removed.is_empty()
                || source_diff == SourceDiff::Reduced
            {
                RecomputeMode::Full
            } else {
                let seeded_sources = match source_diff {
                    SourceDiff::Additive(points) => points,
                    _ => Vec::new(),
                };
                if delta.added.is_empty() && seeded_sources.is_empty() {
                    // Membership and sources match the published result.
                    continue;
                }
                RecomputeMode::Incremental {
                    added: delta.added.iter().copied().collect(),
                    seeded_sources,
                }
            };

            entry.generation += 1;
            let members = self.index.members(connection).cloned().unwrap_or_default();
            debug!(
                "Network '{}': recompute {} ({}) over {} members at tick {}",
                connection,
                entry.generation,
                if mode.is_full() { "full" } else { "incremental" },
                members.len(),
                tick
            );
            jobs.push(RecomputeJob::new(
                connection.clone(),
                entry.generation,
                mode,
                members,
                sources,
                entry.passer.shared_result(),
                *entry.passer.engine(),
            ));
            entry.in_flight = Some(InFlight {
                generation: entry.generation,
                delta,
            });
        }

        jobs
    }

    /// Publish a finished job. Returns `None` if the job was superseded.
    pub fn complete(&mut self, output: RecomputeOutput, tick: u64) -> Option<RecomputeReport> {
        let Some(entry) = self.networks.get_mut(&output.connection) else {
            warn!(
                "Network '{}': dropping recompute for unconfigured connection",
                output.connection
            );
            return None;
        };
        if entry
            .in_flight
            .as_ref()
            .is_none_or(|flight| flight.generation != output.generation)
        {
            debug!(
                "Network '{}': discarding stale recompute {}",
                output.connection, output.generation
            );
            return None;
        }
        entry.in_flight = None;

        let RecomputeOutput {
            connection,
            full,
            sources,
            outcome,
            ..
        } = output;
        let PropagationOutcome {
            result, truncation, ..
        } = outcome;

        if let Some(truncation) = &truncation {
            warn!(
                "Network '{}': propagation truncated ({}), publishing {} reached cells",
                connection, truncation.reason, truncation.reached
            );
            entry.stats.truncations += 1;
        }
        entry.partial_base = matches!(
            truncation.map(|t| t.reason),
            Some(TruncationReason::IterationLimit { .. })
        );

        let changes = entry.passer.publish(result, sources, tick);

        let stats = &mut entry.stats;
        stats.reached_count = entry.passer.result().len();
        stats.last_tick = Some(tick);
        if full {
            stats.full_recomputes += 1;
        } else {
            stats.incremental_recomputes += 1;
        }

        Some(RecomputeReport {
            connection,
            tick,
            full,
            changes,
            truncation,
        })
    }

    /// Run every pending recompute inline and publish the results.
    pub fn flush(&mut self, tick: u64) -> Vec<RecomputeReport> {
        let jobs = self.prepare_jobs(tick);
        jobs.into_iter()
            .filter_map(|job| {
                let output = job.run();
                self.complete(output, tick)
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Snapshot / restore
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> MembershipSnapshot {
        let networks = self
            .networks
            .keys()
            .map(|connection| NetworkMembers {
                connection: connection.name().to_string(),
                points: self.index.points(connection).into_iter().collect(),
            })
            .collect();
        MembershipSnapshot { networks }
    }

    /// Replace all membership with `snapshot` and schedule a full recompute
    /// of every connection. Connections missing from the manager are
    /// configured with the default policy.
    pub fn restore(&mut self, snapshot: MembershipSnapshot) {
        for connection in self.networks.keys() {
            self.index.clear_connection(connection);
        }

        let point_count = snapshot.point_count();
        let network_count = snapshot.networks.len();
        for members in snapshot.networks {
            let connection = Connection::from_name(members.connection);
            if !self.networks.contains_key(&connection) {
                info!(
                    "Restoring unconfigured connection '{}' with the default policy",
                    connection
                );
                self.networks.insert(
                    connection.clone(),
                    NetworkEntry::new(Passer::new(
                        connection.clone(),
                        PropagationPolicy::default(),
                    )),
                );
            }
            for point in members.points {
                self.index.add_point(&connection, point);
            }
        }

        for (connection, entry) in self.networks.iter_mut() {
            entry.pending.added.clear();
            entry.pending.removed.clear();
            entry.pending.force_full = true;
            entry.stats.member_count = self.index.len(connection);
        }

        info!(
            "Restored {} network points across {} connections",
            point_count, network_count
        );
    }

    /// Decode and restore a snapshot produced by
    /// [`MembershipSnapshot::to_bytes`]. Membership is untouched on error.
    pub fn restore_bytes(&mut self, bytes: &[u8]) -> Result<(), NetworkError> {
        let snapshot = MembershipSnapshot::from_bytes(bytes)?;
        self.restore(snapshot);
        Ok(())
    }
}
