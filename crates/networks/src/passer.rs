//! Passer: publishes value changes of one connection to its subscribers.
//!
//! The passer owns the connection's propagation engine, the last published
//! result, and the source set that produced it. After each recompute it diffs
//! the new result against the cache and notifies subscribers only for cells
//! whose value changed. Cells that dropped out of the result are published
//! with the policy's unreachable value.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::connection::Connection;
use crate::point::Point;
use crate::propagation::{PropagationEngine, PropagationPolicy, PropagationResult, SourceSet};

/// Callback invoked with `(point, new_value)`.
pub type ValueCallback = Box<dyn FnMut(Point, f32) + Send + Sync>;

/// Handle returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionToken {
    pub connection: Connection,
    id: u64,
}

/// One published value change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueChange {
    pub point: Point,
    pub value: f32,
    /// Last published value, or `None` if the cell had never been reached.
    pub previous: Option<f32>,
}

pub struct Passer {
    connection: Connection,
    engine: PropagationEngine,
    cache: Arc<PropagationResult>,
    sources: SourceSet,
    subscribers: Vec<(u64, ValueCallback)>,
    next_id: u64,
    last_tick: Option<u64>,
}

impl std::fmt::Debug for Passer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Passer")
            .field("connection", &self.connection)
            .field("policy", self.engine.policy())
            .field("cached_cells", &self.cache.len())
            .field("sources", &self.sources.len())
            .field("subscribers", &self.subscribers.len())
            .field("last_tick", &self.last_tick)
            .finish()
    }
}

impl Passer {
    pub fn new(connection: Connection, policy: PropagationPolicy) -> Self {
        Self {
            connection,
            engine: PropagationEngine::new(policy),
            cache: Arc::new(PropagationResult::default()),
            sources: SourceSet::new(),
            subscribers: Vec::new(),
            next_id: 0,
            last_tick: None,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn engine(&self) -> &PropagationEngine {
        &self.engine
    }

    pub fn policy(&self) -> &PropagationPolicy {
        self.engine.policy()
    }

    pub(crate) fn set_policy(&mut self, policy: PropagationPolicy) {
        self.engine = PropagationEngine::new(policy);
    }

    /// Last published result.
    pub fn result(&self) -> &PropagationResult {
        &self.cache
    }

    pub(crate) fn shared_result(&self) -> Arc<PropagationResult> {
        Arc::clone(&self.cache)
    }

    /// Source set behind the last published result.
    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn value(&self, point: Point) -> Option<f32> {
        self.cache.get(point)
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    pub fn subscribe(
        &mut self,
        callback: impl FnMut(Point, f32) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        SubscriptionToken {
            connection: self.connection.clone(),
            id,
        }
    }

    /// Returns false if the token was not subscribed here.
    pub fn unsubscribe(&mut self, token: &SubscriptionToken) -> bool {
        if token.connection != self.connection {
            return false;
        }
        let before = self.subscribers.len();
        self.subscribers.retain(|(id, _)| *id != token.id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Changes `next` would publish, in ascending point order.
    ///
    /// A cell that was never published counts as holding the unreachable
    /// value, so nothing is published for a cell whose value equals it.
    pub fn diff(&self, next: &PropagationResult) -> Vec<ValueChange> {
        let unreachable = self.policy().unreachable_value;
        let points: BTreeSet<Point> = self
            .cache
            .iter()
            .map(|(p, _)| p)
            .chain(next.iter().map(|(p, _)| p))
            .collect();

        points
            .into_iter()
            .filter_map(|point| {
                let previous = self.cache.get(point);
                let value = next.get(point).unwrap_or(unreachable);
                let shown = previous.unwrap_or(unreachable);
                (value.to_bits() != shown.to_bits()).then_some(ValueChange {
                    point,
                    value,
                    previous,
                })
            })
            .collect()
    }

    /// Publish `next`: notify subscribers of every change, then replace the
    /// cache and the source set it was computed from.
    pub fn publish(
        &mut self,
        next: PropagationResult,
        sources: SourceSet,
        tick: u64,
    ) -> Vec<ValueChange> {
        debug_assert!(
            self.last_tick.is_none_or(|last| tick >= last),
            "passer for '{}' published tick {tick} after {:?}",
            self.connection,
            self.last_tick
        );

        let changes = self.diff(&next);
        for change in &changes {
            for (_, callback) in self.subscribers.iter_mut() {
                callback(change.point, change.value);
            }
        }

        self.cache = Arc::new(next);
        self.sources = sources;
        self.last_tick = Some(tick);
        changes
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::network_graph::NetworkGraph;
    use crate::propagation::Decay;

    const WATER: Connection = Connection::new("water");

    fn linear_policy() -> PropagationPolicy {
        PropagationPolicy::default().with_decay(Decay::Linear { falloff: 3.0 })
    }

    fn compute(passer: &Passer, members: &[(i32, i32)], sources: &SourceSet) -> PropagationResult {
        let set: HashSet<Point> = members.iter().map(|&p| Point::from(p)).collect();
        let graph = NetworkGraph::new(Some(&set), passer.policy().adjacency);
        passer.engine().full(graph, sources).result
    }

    fn recorder(passer: &mut Passer) -> (SubscriptionToken, Arc<Mutex<Vec<(Point, f32)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let token = passer.subscribe(move |p, v| sink.lock().unwrap().push((p, v)));
        (token, log)
    }

    #[test]
    fn test_publish_notifies_changed_points_in_order() {
        let mut passer = Passer::new(WATER, linear_policy());
        let (_, log) = recorder(&mut passer);
        let sources = SourceSet::new().with_strength(Point::new(0, 0), 10.0);
        let result = compute(&passer, &[(0, 0), (1, 0), (2, 0)], &sources);

        let changes = passer.publish(result, sources, 1);
        assert_eq!(changes.len(), 3);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                (Point::new(0, 0), 10.0),
                (Point::new(1, 0), 7.0),
                (Point::new(2, 0), 4.0),
            ]
        );
        assert_eq!(passer.value(Point::new(1, 0)), Some(7.0));
    }

    #[test]
    fn test_identical_result_publishes_nothing() {
        let mut passer = Passer::new(WATER, linear_policy());
        let sources = SourceSet::new().with_strength(Point::new(0, 0), 10.0);
        let members = [(0, 0), (1, 0), (2, 0)];
        let first = compute(&passer, &members, &sources);
        passer.publish(first, sources.clone(), 1);

        let (_, log) = recorder(&mut passer);
        let again = compute(&passer, &members, &sources);
        let changes = passer.publish(again, sources, 2);
        assert!(changes.is_empty());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_disappeared_points_publish_unreachable_value() {
        let policy = linear_policy().with_unreachable_value(-1.0);
        let mut passer = Passer::new(WATER, policy);
        let sources = SourceSet::new().with_strength(Point::new(0, 0), 10.0);
        let first = compute(&passer, &[(0, 0), (1, 0), (2, 0)], &sources);
        passer.publish(first, sources.clone(), 1);

        let (_, log) = recorder(&mut passer);
        let second = compute(&passer, &[(0, 0), (2, 0)], &sources);
        let changes = passer.publish(second, sources, 2);

        assert_eq!(
            *log.lock().unwrap(),
            vec![(Point::new(1, 0), -1.0), (Point::new(2, 0), -1.0)]
        );
        assert_eq!(changes[0].previous, Some(7.0));
        assert!(passer.value(Point::new(2, 0)).is_none());
    }

    #[test]
    fn test_zero_valued_cells_match_default_sentinel() {
        let mut passer = Passer::new(WATER, linear_policy());
        let sources = SourceSet::new().with_strength(Point::new(0, 0), 3.0);
        let result = compute(&passer, &[(0, 0), (1, 0), (2, 0)], &sources);
        assert_eq!(result.get(Point::new(2, 0)), Some(0.0));

        let changes = passer.publish(result, sources, 1);
        // (1,0) and (2,0) both decayed to 0, the same as never reached.
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].point, Point::new(0, 0));
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut passer = Passer::new(WATER, linear_policy());
        let (token, log) = recorder(&mut passer);
        assert!(passer.unsubscribe(&token));
        assert!(!passer.unsubscribe(&token));
        assert_eq!(passer.subscriber_count(), 0);

        let sources = SourceSet::new().with(Point::new(0, 0));
        let result = compute(&passer, &[(0, 0)], &sources);
        passer.publish(result, sources, 1);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_foreign_token_is_rejected() {
        let mut water = Passer::new(WATER, linear_policy());
        let mut power = Passer::new(Connection::new("power"), linear_policy());
        let token = power.subscribe(|_, _| {});
        water.subscribe(|_, _| {});
        assert!(!water.unsubscribe(&token));
        assert_eq!(water.subscriber_count(), 1);
    }
}
