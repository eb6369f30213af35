/// Default source strength when a source does not specify one.
pub const DEFAULT_MAX_VALUE: f32 = 100.0;

/// Default linear falloff per decay step.
pub const DEFAULT_FALLOFF: f32 = 1.0;

/// Default cap on frontier pops per recompute. Guards pathological networks.
pub const DEFAULT_MAX_ITERATIONS: usize = 1 << 20;

/// Value published for points that dropped out of a propagation result.
pub const UNREACHABLE_VALUE: f32 = 0.0;

/// Networks with at least this many members recompute on the async task pool.
pub const DEFAULT_ASYNC_THRESHOLD: usize = 16_384;
