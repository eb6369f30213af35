use std::collections::{HashMap, VecDeque};

use crate::network_graph::NetworkGraph;
use crate::point::Point;

use super::policy::{PropagationPolicy, SourceSet};
use super::result::{
    Labels, PropagationOutcome, PropagationResult, Reach, Truncation, TruncationReason,
};

type Frontier = VecDeque<(Point, Reach)>;

/// Breadth-first label-correcting relaxation of source values over a
/// network graph.
///
/// Each cell keeps every `(value, steps)` reach that no other reach
/// dominates. A weaker reach with fewer steps can still carry further under
/// a step bound, so both survive until one is at least as good on both
/// counts. The resulting label sets do not depend on traversal order, which
/// makes full and incremental runs agree with or without `max_steps`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PropagationEngine {
    policy: PropagationPolicy,
}

impl PropagationEngine {
    pub fn new(policy: PropagationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PropagationPolicy {
        &self.policy
    }

    /// Recompute every value from scratch.
    pub fn full(&self, graph: NetworkGraph<'_>, sources: &SourceSet) -> PropagationOutcome {
        #[cfg(feature = "trace")]
        let _span = bevy::log::info_span!("propagate_full").entered();

        let mut cells = HashMap::new();
        let mut frontier = Frontier::new();
        self.seed_sources(graph, sources, sources.points(), &mut frontier);
        self.relax(graph, &mut cells, frontier)
    }

    /// Continue from `previous` after cells were added and/or sources were
    /// added or strengthened. Only valid when nothing was removed.
    ///
    /// Each member neighbour of an added cell is expanded again from all of
    /// its recorded reaches, and each seeded source re-enters the frontier.
    pub fn incremental(
        &self,
        graph: NetworkGraph<'_>,
        sources: &SourceSet,
        previous: &PropagationResult,
        added: &[Point],
        seeded_sources: &[Point],
    ) -> PropagationOutcome {
        #[cfg(feature = "trace")]
        let _span = bevy::log::info_span!("propagate_incremental").entered();

        let mut cells = previous.cells.clone();
        let mut frontier = Frontier::new();

        for &point in added {
            if !graph.contains(point) {
                continue;
            }
            for neighbor in graph.neighbors(point) {
                let Some(labels) = cells.get(&neighbor) else {
                    continue;
                };
                for &reach in labels {
                    self.push_neighbors(graph, &cells, &mut frontier, neighbor, reach);
                }
            }
        }

        // Added cells that are themselves sources, plus new/stronger sources.
        let newly_sourced = added
            .iter()
            .copied()
            .filter(|p| sources.contains(*p))
            .chain(seeded_sources.iter().copied());
        self.seed_sources(graph, sources, newly_sourced, &mut frontier);

        self.relax(graph, &mut cells, frontier)
    }

    fn seed_sources(
        &self,
        graph: NetworkGraph<'_>,
        sources: &SourceSet,
        points: impl Iterator<Item = Point>,
        frontier: &mut Frontier,
    ) {
        for point in points {
            if !graph.contains(point) {
                continue;
            }
            if let Some(value) = sources.strength(point, &self.policy) {
                frontier.push_back((point, Reach { value, steps: 0 }));
            }
        }
    }

    fn relax(
        &self,
        graph: NetworkGraph<'_>,
        cells: &mut HashMap<Point, Labels>,
        mut frontier: Frontier,
    ) -> PropagationOutcome {
        let mut iterations = 0usize;
        let mut iteration_limited = false;

        while let Some((point, reach)) = frontier.pop_front() {
            if iterations >= self.policy.max_iterations {
                iteration_limited = true;
                break;
            }
            iterations += 1;

            if !record(cells.entry(point).or_default(), reach) {
                continue;
            }
            self.push_neighbors(graph, cells, &mut frontier, point, reach);
        }

        let result = PropagationResult {
            cells: std::mem::take(cells),
        };
        let truncation = if iteration_limited {
            Some(TruncationReason::IterationLimit {
                max_iterations: self.policy.max_iterations,
            })
        } else if self.held_back_by_step_limit(graph, &result) {
            Some(self.step_limit_reason())
        } else {
            None
        }
        .map(|reason| Truncation {
            reason,
            reached: result.len(),
        });

        PropagationOutcome {
            result,
            truncation,
            iterations,
        }
    }

    /// Queue every neighbour of `origin` whose recorded reaches do not
    /// already dominate the decayed one.
    fn push_neighbors(
        &self,
        graph: NetworkGraph<'_>,
        cells: &HashMap<Point, Labels>,
        frontier: &mut Frontier,
        origin: Point,
        reach: Reach,
    ) {
        let candidate = self.extend(reach);
        if self.policy.max_steps.is_some_and(|max| candidate.steps > max) {
            return;
        }
        for neighbor in graph.neighbors(origin) {
            if cells
                .get(&neighbor)
                .is_some_and(|labels| labels.iter().any(|l| l.dominates(&candidate)))
            {
                continue;
            }
            frontier.push_back((neighbor, candidate));
        }
    }

    /// True if some cell at exactly `max_steps` would have raised a
    /// neighbour's published value, or reached it at all, given one more
    /// step. Evaluated on the settled result so the answer does not depend
    /// on traversal order.
    fn held_back_by_step_limit(&self, graph: NetworkGraph<'_>, result: &PropagationResult) -> bool {
        let Some(max_steps) = self.policy.max_steps else {
            return false;
        };
        result.cells.iter().any(|(&point, labels)| {
            labels
                .iter()
                .filter(|reach| reach.steps == max_steps)
                .any(|&reach| {
                    let value = self.policy.decay.apply(reach.value);
                    graph
                        .neighbors(point)
                        .any(|neighbor| result.get(neighbor).is_none_or(|best| best < value))
                })
        })
    }

    fn extend(&self, reach: Reach) -> Reach {
        Reach {
            value: self.policy.decay.apply(reach.value),
            steps: reach.steps.saturating_add(1),
        }
    }

    fn step_limit_reason(&self) -> TruncationReason {
        TruncationReason::StepLimit {
            max_steps: self.policy.max_steps.unwrap_or(u32::MAX),
        }
    }
}

/// Insert `reach` into a cell's label set unless an existing label dominates
/// it, dropping the labels it dominates. Returns true if it was inserted.
fn record(labels: &mut Labels, reach: Reach) -> bool {
    if labels.iter().any(|l| l.dominates(&reach)) {
        return false;
    }
    labels.retain(|l| !reach.dominates(l));
    let at = labels.partition_point(|l| l.steps < reach.steps);
    labels.insert(at, reach);
    true
}
