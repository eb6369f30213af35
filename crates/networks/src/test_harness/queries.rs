//! Query helpers for `TestNetwork`.

use bevy::prelude::*;

use crate::connection::Connection;
use crate::events::{PointValueChanged, PropagationTruncated};
use crate::plugin::{InFlightRecomputes, TickCounter};
use crate::point::Point;
use crate::stats::NetworkStats;

use super::TestNetwork;

impl TestNetwork {
    pub fn current_tick(&self) -> u64 {
        self.app.world().resource::<TickCounter>().0
    }

    /// Published value at `(x, y)`, `None` if unreached.
    pub fn value(&self, name: &'static str, x: i32, y: i32) -> Option<f32> {
        self.manager()
            .value(&Connection::new(name), Point::new(x, y))
            .expect("connection not configured")
    }

    pub fn stats(&self, name: &'static str) -> NetworkStats {
        self.manager()
            .stats(&Connection::new(name))
            .expect("connection not configured")
            .clone()
    }

    pub fn in_flight_count(&self) -> usize {
        self.app.world().resource::<InFlightRecomputes>().len()
    }

    pub fn add_point(&mut self, name: &'static str, x: i32, y: i32) -> bool {
        self.manager_mut()
            .add_point(&Connection::new(name), Point::new(x, y))
            .expect("connection not configured")
    }

    pub fn remove_point(&mut self, name: &'static str, x: i32, y: i32) -> bool {
        self.manager_mut()
            .remove_point(&Connection::new(name), Point::new(x, y))
            .expect("connection not configured")
    }

    /// All `PointValueChanged` events sent since the last drain.
    pub fn drain_value_changes(&mut self) -> Vec<PointValueChanged> {
        self.app
            .world_mut()
            .resource_mut::<Events<PointValueChanged>>()
            .drain()
            .collect()
    }

    /// All `PropagationTruncated` events sent since the last drain.
    pub fn drain_truncations(&mut self) -> Vec<PropagationTruncated> {
        self.app
            .world_mut()
            .resource_mut::<Events<PropagationTruncated>>()
            .drain()
            .collect()
    }
}
