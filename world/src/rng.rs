//! Seeded random stream used for generation, placement and combat rolls.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tilequest_core::CellCoord;

/// Reproducible stream of uniform values in `[0, 1)`.
///
/// Two streams built from the same seed yield identical sequences. Every
/// helper consumes exactly one or two unit draws so call order alone decides
/// the outcome.
#[derive(Clone)]
pub struct SeededRng {
    seed: u32,
    inner: ChaCha8Rng,
}

impl SeededRng {
    /// Creates a stream positioned at the start of the sequence for `seed`.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            inner: ChaCha8Rng::seed_from_u64(u64::from(seed)),
        }
    }

    /// Seed the stream was created from.
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Restarts the stream from the beginning of the sequence for `seed`.
    pub fn reseed(&mut self, seed: u32) {
        *self = Self::new(seed);
    }

    /// Next uniform value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer in `0..bound`, computed as `floor(unit * bound)`.
    ///
    /// A zero bound yields zero without consuming the stream.
    pub fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }

        let scaled = (self.next_unit() * f64::from(bound)).floor() as u32;
        scaled.min(bound - 1)
    }

    /// Uniform integer in `min..=max`.
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }

        min + self.below(max - min + 1)
    }

    /// Returns `true` with probability `probability`.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }

    /// Uniform cell inside a `columns × rows` grid, x drawn before y.
    pub fn cell(&mut self, columns: u32, rows: u32) -> CellCoord {
        let x = self.below(columns);
        let y = self.below(rows);
        CellCoord::new(x, y)
    }
}

impl fmt::Debug for SeededRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededRng")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}
