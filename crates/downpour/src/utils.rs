//! Generally useful shared code.

/// Reset the terminal's attributes and put the cursor back in the top-left.
pub const RESET_SCREEN: &str = "\x1b[0m\x1b[2J\x1b[H";

/// The number of microseconds in a second.
pub const ONE_MICROSECOND: u64 = 1_000_000;

/// Hermite interpolation between 2 edges. Reversing the edges gives a falling curve.
#[must_use]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * 2.0f32.mul_add(-t, 3.0)
}

/// Pick a value in `[low, high)` given a number in `[0, 1)`.
#[must_use]
pub fn lerp(low: f32, high: f32, unit: f32) -> f32 {
    (high - low).mul_add(unit, low)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn smoothstep_edges() {
        assert!(smoothstep(0.0, 1.0, -1.0).abs() < f32::EPSILON);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < f32::EPSILON);
        assert!((smoothstep(0.0, 1.0, 2.0) - 1.0).abs() < f32::EPSILON);
        assert!((smoothstep(1.0, 0.0, 0.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn lerp_range() {
        assert!((lerp(10.0, 30.0, 0.5) - 20.0).abs() < f32::EPSILON);
        assert!((lerp(2.0, 12.0, 0.0) - 2.0).abs() < f32::EPSILON);
    }
}
