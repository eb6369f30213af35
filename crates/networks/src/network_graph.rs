//! Network Graph: adjacency derived on demand from a member set.
//!
//! No edge list is stored; each neighbour query checks the 4 (or 8) grid
//! neighbours of a point against the member set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// Which grid neighbours count as connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adjacency {
    /// Up/down/left/right only.
    #[default]
    Cardinal,
    /// Cardinal plus the four diagonals.
    Octile,
}

/// Borrowed adjacency view over one connection's members.
#[derive(Debug, Clone, Copy)]
pub struct NetworkGraph<'a> {
    members: Option<&'a HashSet<Point>>,
    adjacency: Adjacency,
}

impl<'a> NetworkGraph<'a> {
    pub fn new(members: Option<&'a HashSet<Point>>, adjacency: Adjacency) -> Self {
        Self { members, adjacency }
    }

    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        self.members.is_some_and(|m| m.contains(&point))
    }

    pub fn member_count(&self) -> usize {
        self.members.map_or(0, HashSet::len)
    }

    pub fn adjacency(&self) -> Adjacency {
        self.adjacency
    }

    /// Member neighbours of `point`. The point itself need not be a member.
    pub fn neighbors(&self, point: Point) -> impl Iterator<Item = Point> + 'a {
        let (candidates, count) = match self.adjacency {
            Adjacency::Cardinal => {
                let (n, count) = point.neighbors4();
                let mut all = [Point::default(); 8];
                all[..4].copy_from_slice(&n);
                (all, count)
            }
            Adjacency::Octile => point.neighbors8(),
        };
        let members = self.members;
        candidates
            .into_iter()
            .take(count)
            .filter(move |p| members.is_some_and(|m| m.contains(p)))
    }
}
