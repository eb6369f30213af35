//! Self-contained recompute work for one connection.
//!
//! A [`RecomputeJob`] owns a snapshot of everything the engine needs, so it
//! can run inline or on a worker thread. Dropping a job (or the task running
//! it) abandons it without side effects: results only reach subscribers once
//! the manager accepts the matching [`RecomputeOutput`].

use std::collections::HashSet;
use std::sync::Arc;

use crate::connection::Connection;
use crate::network_graph::NetworkGraph;
use crate::point::Point;
use crate::propagation::{PropagationEngine, PropagationOutcome, PropagationResult, SourceSet};

/// Which kind of pass a job performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecomputeMode {
    Full,
    Incremental {
        added: Vec<Point>,
        seeded_sources: Vec<Point>,
    },
}

impl RecomputeMode {
    pub fn is_full(&self) -> bool {
        matches!(self, RecomputeMode::Full)
    }
}

pub struct RecomputeJob {
    pub connection: Connection,
    pub generation: u64,
    pub mode: RecomputeMode,
    members: HashSet<Point>,
    sources: SourceSet,
    base: Arc<PropagationResult>,
    engine: PropagationEngine,
}

impl RecomputeJob {
    pub(crate) fn new(
        connection: Connection,
        generation: u64,
        mode: RecomputeMode,
        members: HashSet<Point>,
        sources: SourceSet,
        base: Arc<PropagationResult>,
        engine: PropagationEngine,
    ) -> Self {
        Self {
            connection,
            generation,
            mode,
            members,
            sources,
            base,
            engine,
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn run(self) -> RecomputeOutput {
        let graph = NetworkGraph::new(Some(&self.members), self.engine.policy().adjacency);
        let outcome = match &self.mode {
            RecomputeMode::Full => self.engine.full(graph, &self.sources),
            RecomputeMode::Incremental {
                added,
                seeded_sources,
            } => self
                .engine
                .incremental(graph, &self.sources, &self.base, added, seeded_sources),
        };
        RecomputeOutput {
            connection: self.connection,
            generation: self.generation,
            full: self.mode.is_full(),
            member_count: self.members.len(),
            sources: self.sources,
            outcome,
        }
    }
}

/// Finished job, ready for [`NetworkManager::complete`](crate::network_manager::NetworkManager::complete).
#[derive(Debug)]
pub struct RecomputeOutput {
    pub connection: Connection,
    pub generation: u64,
    pub full: bool,
    pub member_count: usize,
    pub sources: SourceSet,
    pub outcome: PropagationOutcome,
}
