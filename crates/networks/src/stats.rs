use serde::{Deserialize, Serialize};

/// Per-connection counters, updated as the manager mutates membership and
/// accepts recompute results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Cells currently in the network.
    pub member_count: usize,
    /// Cells with a value in the last published result.
    pub reached_count: usize,
    pub full_recomputes: u64,
    pub incremental_recomputes: u64,
    /// In-flight recomputes superseded by a newer mutation.
    pub cancelled_recomputes: u64,
    pub truncations: u64,
    /// Tick of the last published result.
    pub last_tick: Option<u64>,
}

impl NetworkStats {
    pub fn total_recomputes(&self) -> u64 {
        self.full_recomputes + self.incremental_recomputes
    }

    /// Fraction of members with a value (1.0 for an empty network).
    pub fn coverage_ratio(&self) -> f32 {
        if self.member_count == 0 {
            return 1.0;
        }
        self.reached_count as f32 / self.member_count as f32
    }
}
