//! # TestNetwork: headless integration test harness
//!
//! Wraps a `bevy::app::App` with `MinimalPlugins` + `NetworkPlugin` so tests
//! can lay out networks with builder methods, advance `FixedUpdate` ticks and
//! inspect the published values and events.

mod assertions;
mod queries;

use bevy::app::App;
use bevy::prelude::*;

use crate::connection::Connection;
use crate::network_manager::NetworkManager;
use crate::plugin::{NetworkPlugin, NetworkSettings};
use crate::point::Point;
use crate::propagation::{PropagationPolicy, SourceSet};

pub struct TestNetwork {
    app: App,
}

impl Default for TestNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl TestNetwork {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// An app with no configured connections.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(NetworkPlugin);
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    pub fn with_connection(mut self, name: &'static str, policy: PropagationPolicy) -> Self {
        self.manager_mut()
            .configure(Connection::new(name), policy)
            .expect("connection configured twice in test setup");
        self
    }

    pub fn with_points(
        mut self,
        name: &'static str,
        points: impl IntoIterator<Item = (i32, i32)>,
    ) -> Self {
        let connection = Connection::new(name);
        let mut manager = self.manager_mut();
        for (x, y) in points {
            manager
                .add_point(&connection, Point::new(x, y))
                .expect("connection not configured");
        }
        self
    }

    /// Horizontal run of `len` cells starting at `(x, y)`.
    pub fn with_line(self, name: &'static str, (x, y): (i32, i32), len: i32) -> Self {
        self.with_points(name, (0..len).map(move |i| (x + i, y)))
    }

    pub fn with_sources(mut self, name: &'static str, sources: SourceSet) -> Self {
        self.manager_mut()
            .set_sources(&Connection::new(name), sources)
            .expect("connection not configured");
        self
    }

    pub fn with_async_threshold(mut self, async_threshold: usize) -> Self {
        self.app
            .world_mut()
            .insert_resource(NetworkSettings { async_threshold });
        self
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run N fixed-update ticks by executing the `FixedUpdate` schedule
    /// directly, bypassing Bevy's time system.
    ///
    /// Without the `multi_threaded` feature async tasks run on the main
    /// thread's local executor, so the task pools are ticked after every
    /// schedule run.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
            bevy::tasks::tick_global_task_pools_on_main_thread();
            std::thread::yield_now();
        }
    }

    /// Tick until no connection has pending or in-flight work.
    /// Panics after `max_ticks`.
    pub fn tick_until_idle(&mut self, max_ticks: u32) -> u32 {
        for ticks in 0..max_ticks {
            if !self.manager().has_pending_work() {
                return ticks;
            }
            self.tick(1);
        }
        assert!(
            !self.manager().has_pending_work(),
            "networks still busy after {max_ticks} ticks"
        );
        max_ticks
    }

    // -----------------------------------------------------------------------
    // Direct access
    // -----------------------------------------------------------------------

    pub fn manager(&self) -> &NetworkManager {
        self.app.world().resource::<NetworkManager>()
    }

    pub fn manager_mut(&mut self) -> Mut<'_, NetworkManager> {
        self.app.world_mut().resource_mut::<NetworkManager>()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }
}
