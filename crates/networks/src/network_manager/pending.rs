use std::collections::BTreeSet;

use crate::grid_index::{TopologyChange, TopologyDelta};
use crate::point::Point;
use crate::propagation::SourceSet;

/// Net changes to one connection since its last published result.
///
/// Adding then removing the same point (or the reverse) cancels out, so the
/// sets always describe the difference between the published base and the
/// current membership.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PendingDelta {
    pub added: BTreeSet<Point>,
    pub removed: BTreeSet<Point>,
    pub sources: Option<SourceSet>,
    pub force_full: bool,
}

impl PendingDelta {
    pub fn record(&mut self, delta: &TopologyDelta) {
        match delta.change {
            TopologyChange::Added => self.add(delta.point),
            TopologyChange::Removed => self.remove(delta.point),
        }
    }

    fn add(&mut self, point: Point) {
        if !self.removed.remove(&point) {
            self.added.insert(point);
        }
    }

    fn remove(&mut self, point: Point) {
        if !self.added.remove(&point) {
            self.removed.insert(point);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.sources.is_none() && !self.force_full
    }

    /// Fold a newer delta on top of this one.
    pub fn merge(mut self, newer: PendingDelta) -> PendingDelta {
        for point in newer.added {
            self.add(point);
        }
        for point in newer.removed {
            self.remove(point);
        }
        if newer.sources.is_some() {
            self.sources = newer.sources;
        }
        self.force_full |= newer.force_full;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;

    fn delta(x: i32, change: TopologyChange) -> TopologyDelta {
        TopologyDelta {
            connection: Connection::new("power"),
            point: Point::new(x, 0),
            change,
        }
    }

    #[test]
    fn test_add_then_remove_cancels() {
        let mut pending = PendingDelta::default();
        pending.record(&delta(1, TopologyChange::Added));
        pending.record(&delta(1, TopologyChange::Removed));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_remove_then_add_cancels() {
        let mut pending = PendingDelta::default();
        pending.record(&delta(1, TopologyChange::Removed));
        pending.record(&delta(1, TopologyChange::Added));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_many_additions_batch_into_one_delta() {
        let mut pending = PendingDelta::default();
        for x in 0..100 {
            pending.record(&delta(x, TopologyChange::Added));
        }
        assert_eq!(pending.added.len(), 100);
        assert!(pending.removed.is_empty());
    }

    #[test]
    fn test_merge_cancels_across_batches() {
        let mut older = PendingDelta::default();
        older.record(&delta(1, TopologyChange::Added));
        older.record(&delta(2, TopologyChange::Removed));

        let mut newer = PendingDelta::default();
        newer.record(&delta(1, TopologyChange::Removed));
        newer.record(&delta(3, TopologyChange::Added));
        newer.sources = Some(SourceSet::new().with(Point::new(3, 0)));

        let merged = older.merge(newer);
        assert_eq!(merged.added, BTreeSet::from([Point::new(3, 0)]));
        assert_eq!(merged.removed, BTreeSet::from([Point::new(2, 0)]));
        assert!(merged.sources.is_some());
        assert!(!merged.force_full);
    }
}
