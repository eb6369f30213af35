use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_FALLOFF, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_VALUE, UNREACHABLE_VALUE};
use crate::network_graph::Adjacency;
use crate::point::Point;

/// How a value changes per step away from its source.
///
/// Every variant is monotone and never increases a value, which is what lets
/// max-relaxation converge to a single fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Decay {
    /// Values carry unchanged; useful for pure reachability.
    None,
    /// Subtract `falloff` per step, floored at 0.
    Linear { falloff: f32 },
    /// Multiply by `factor` (clamped to `[0, 1]`) per step.
    Multiplicative { factor: f32 },
}

impl Default for Decay {
    fn default() -> Self {
        Decay::Linear {
            falloff: DEFAULT_FALLOFF,
        }
    }
}

impl Decay {
    /// Value one step further from the source.
    #[inline]
    pub fn apply(self, value: f32) -> f32 {
        match self {
            Decay::None => value,
            Decay::Linear { falloff } => (value - falloff.max(0.0)).max(0.0),
            Decay::Multiplicative { factor } => (value * factor.clamp(0.0, 1.0)).max(0.0),
        }
    }
}

/// Per-connection propagation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationPolicy {
    /// Strength of sources that don't specify their own.
    pub max_value: f32,
    pub decay: Decay,
    pub adjacency: Adjacency,
    /// Maximum decay steps from a source. `None` means unbounded.
    pub max_steps: Option<u32>,
    /// Maximum frontier pops per recompute.
    pub max_iterations: usize,
    /// Value published for cells that become unreachable.
    pub unreachable_value: f32,
}

impl Default for PropagationPolicy {
    fn default() -> Self {
        Self {
            max_value: DEFAULT_MAX_VALUE,
            decay: Decay::default(),
            adjacency: Adjacency::default(),
            max_steps: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            unreachable_value: UNREACHABLE_VALUE,
        }
    }
}

impl PropagationPolicy {
    pub fn with_max_value(mut self, max_value: f32) -> Self {
        self.max_value = max_value;
        self
    }

    pub fn with_decay(mut self, decay: Decay) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_adjacency(mut self, adjacency: Adjacency) -> Self {
        self.adjacency = adjacency;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_unreachable_value(mut self, value: f32) -> Self {
        self.unreachable_value = value;
        self
    }

    /// Reachability only: every connected cell gets `max_value`.
    pub fn reachability() -> Self {
        Self::default().with_decay(Decay::None)
    }
}

/// Source points of one connection, each with an optional strength override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSet {
    sources: BTreeMap<Point, Option<f32>>,
}

/// How a new source set relates to the previous one.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SourceDiff {
    Unchanged,
    /// Only new or strengthened sources; can be seeded incrementally.
    Additive(Vec<Point>),
    /// A source was removed or weakened; needs a full recompute.
    Reduced,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, point: Point) -> Self {
        self.insert(point);
        self
    }

    pub fn with_strength(mut self, point: Point, strength: f32) -> Self {
        self.insert_with_strength(point, strength);
        self
    }

    pub fn insert(&mut self, point: Point) {
        self.sources.insert(point, None);
    }

    /// Non-finite or negative strengths are stored as 0.
    pub fn insert_with_strength(&mut self, point: Point, strength: f32) {
        let strength = if strength.is_finite() {
            strength.max(0.0)
        } else {
            0.0
        };
        self.sources.insert(point, Some(strength));
    }

    pub fn remove(&mut self, point: Point) -> bool {
        self.sources.remove(&point).is_some()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.sources.contains_key(&point)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.sources.keys().copied()
    }

    /// Resolved strength of a source under `policy`, or `None` if `point`
    /// is not a source.
    pub fn strength(&self, point: Point, policy: &PropagationPolicy) -> Option<f32> {
        self.sources
            .get(&point)
            .map(|s| s.unwrap_or(policy.max_value))
    }

    /// Sources in ascending point order with their resolved strength.
    pub fn resolved<'a>(
        &'a self,
        policy: &'a PropagationPolicy,
    ) -> impl Iterator<Item = (Point, f32)> + 'a {
        self.sources
            .iter()
            .map(move |(&p, s)| (p, s.unwrap_or(policy.max_value)))
    }

    pub(crate) fn diff(&self, next: &SourceSet, policy: &PropagationPolicy) -> SourceDiff {
        let mut seeded = Vec::new();
        for (point, old) in self.resolved(policy) {
            match next.strength(point, policy) {
                None => return SourceDiff::Reduced,
                Some(new) if new < old => return SourceDiff::Reduced,
                Some(new) if new > old => seeded.push(point),
                Some(_) => {}
            }
        }
        seeded.extend(next.points().filter(|p| !self.contains(*p)));
        if seeded.is_empty() {
            SourceDiff::Unchanged
        } else {
            seeded.sort();
            SourceDiff::Additive(seeded)
        }
    }
}

impl FromIterator<Point> for SourceSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut set = SourceSet::new();
        for p in iter {
            set.insert(p);
        }
        set
    }
}
