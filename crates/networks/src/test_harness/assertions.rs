//! Assertion helpers for `TestNetwork` integration tests.

use super::TestNetwork;

impl TestNetwork {
    /// Assert the published value at `(x, y)` equals `expected`.
    pub fn assert_value(&self, name: &'static str, (x, y): (i32, i32), expected: f32) {
        let value = self.value(name, x, y);
        assert_eq!(
            value,
            Some(expected),
            "Expected {name} value {expected} at ({x}, {y}), got {value:?}"
        );
    }

    /// Assert every `((x, y), value)` pair in `expected`.
    pub fn assert_values(&self, name: &'static str, expected: &[((i32, i32), f32)]) {
        for &(point, value) in expected {
            self.assert_value(name, point, value);
        }
    }

    /// Assert `(x, y)` has no published value.
    pub fn assert_unreached(&self, name: &'static str, (x, y): (i32, i32)) {
        let value = self.value(name, x, y);
        assert!(
            value.is_none(),
            "Expected ({x}, {y}) unreached on {name}, got {value:?}"
        );
    }

    /// Assert the published result has exactly `expected` reached cells.
    pub fn assert_reached_count(&self, name: &'static str, expected: usize) {
        let reached = self.stats(name).reached_count;
        assert_eq!(
            reached, expected,
            "Expected {expected} reached cells on {name}, got {reached}"
        );
    }
}
