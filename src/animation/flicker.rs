//! Shared flicker randomness.
//!
//! Flickering lights draw from one process-wide generator passed into the
//! animation pass, so all lights in a scene flicker in correlation. Keeping
//! the state an explicit object (rather than a hidden global) lets tests
//! substitute a seeded instance and replay the exact sequence.

/// Linear congruential generator (Numerical Recipes constants).
#[derive(Debug, Clone)]
pub struct FlickerRng {
    state: u32,
}

impl FlickerRng {
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.state
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / 16_777_216.0
    }

    /// One flicker evaluation: a flickering light stays visible 75% of the
    /// time.
    pub fn flicker_visible(&mut self) -> bool {
        self.next_f32() >= 0.25
    }
}

impl Default for FlickerRng {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sequences_replay() {
        let mut a = FlickerRng::new(42);
        let mut b = FlickerRng::new(42);
        for _ in 0..64 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn unit_range() {
        let mut rng = FlickerRng::new(7);
        for _ in 0..256 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
