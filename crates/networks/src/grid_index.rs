//! Grid Index: which cells belong to which utility network.
//!
//! Membership is stored as one hash set per connection, so membership tests
//! are O(1) and a point can belong to any number of networks at once. Every
//! effective mutation returns a [`TopologyDelta`] that the network manager
//! batches for the next recompute; no-op mutations return `None`.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::connection::Connection;
use crate::network_graph::{Adjacency, NetworkGraph};
use crate::point::Point;

/// Direction of a membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyChange {
    Added,
    Removed,
}

/// A single effective membership change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyDelta {
    pub connection: Connection,
    pub point: Point,
    pub change: TopologyChange,
}

/// Mapping from connection to the set of its member points.
#[derive(Debug, Clone, Default)]
pub struct GridIndex {
    networks: HashMap<Connection, HashSet<Point>>,
}

impl GridIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `point` as a member of `connection`. No-op if already a member.
    pub fn add_point(&mut self, connection: &Connection, point: Point) -> Option<TopologyDelta> {
        let inserted = self
            .networks
            .entry(connection.clone())
            .or_default()
            .insert(point);
        inserted.then(|| TopologyDelta {
            connection: connection.clone(),
            point,
            change: TopologyChange::Added,
        })
    }

    /// Remove `point` from `connection`. No-op if it was not a member.
    pub fn remove_point(
        &mut self,
        connection: &Connection,
        point: Point,
    ) -> Option<TopologyDelta> {
        let removed = self
            .networks
            .get_mut(connection)
            .is_some_and(|members| members.remove(&point));
        removed.then(|| TopologyDelta {
            connection: connection.clone(),
            point,
            change: TopologyChange::Removed,
        })
    }

    #[inline]
    pub fn has_point(&self, connection: &Connection, point: Point) -> bool {
        self.networks
            .get(connection)
            .is_some_and(|members| members.contains(&point))
    }

    /// Sorted copy of the members of `connection`. Mutating the returned set
    /// does not affect the index.
    pub fn points(&self, connection: &Connection) -> BTreeSet<Point> {
        self.networks
            .get(connection)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Borrowed view of the member set, if the connection has ever had one.
    pub fn members(&self, connection: &Connection) -> Option<&HashSet<Point>> {
        self.networks.get(connection)
    }

    pub fn len(&self, connection: &Connection) -> usize {
        self.networks.get(connection).map_or(0, HashSet::len)
    }

    pub fn is_empty(&self, connection: &Connection) -> bool {
        self.len(connection) == 0
    }

    /// Connections with at least one member, sorted by name.
    pub fn connections(&self) -> Vec<Connection> {
        let mut out: Vec<Connection> = self
            .networks
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(c, _)| c.clone())
            .collect();
        out.sort();
        out
    }

    /// Derived adjacency view over one connection.
    pub fn graph(&self, connection: &Connection, adjacency: Adjacency) -> NetworkGraph<'_> {
        NetworkGraph::new(self.networks.get(connection), adjacency)
    }

    /// Drop every membership of `connection`, returning the removed points.
    pub fn clear_connection(&mut self, connection: &Connection) -> Vec<Point> {
        let mut removed: Vec<Point> = self
            .networks
            .remove(connection)
            .map(|members| members.into_iter().collect())
            .unwrap_or_default();
        removed.sort();
        removed
    }
}
