//! Sources of randomness for the flight model.
//!
//! The engine never touches a random number generator directly. It asks an
//! [`Entropy`] for three kinds of draws (a weighted coin flip, a real
//! number in a range, a small integer in a range) so tests can replace the
//! generator with [`FixedEntropy`] and get exact, repeatable numbers.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A source of the random draws the engine needs each tick.
pub trait Entropy {
    /// Return `true` with the given probability. Values outside `0.0..=1.0`
    /// behave as the nearest bound.
    fn chance(&mut self, probability: f64) -> bool;

    /// Draw a real number from `low..=high`. Returns `low` when the range
    /// is empty.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Draw an integer from `low..=high`. Returns `low` when the range is
    /// empty.
    fn uniform_int(&mut self, low: u8, high: u8) -> u8;
}

/// [`Entropy`] backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RandEntropy<R = SmallRng> {
    rng: R,
}

impl RandEntropy<SmallRng> {
    /// Seed a fast non-cryptographic generator from the operating system.
    pub fn from_os() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Seed a fast non-cryptographic generator from a fixed value.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is set, OS-seeded otherwise.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_os, Self::seeded)
    }
}

impl<R: Rng> Entropy for RandEntropy<R> {
    fn chance(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() < probability
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high > low {
            self.rng.random_range(low..=high)
        } else {
            low
        }
    }

    fn uniform_int(&mut self, low: u8, high: u8) -> u8 {
        if high > low {
            self.rng.random_range(low..=high)
        } else {
            low
        }
    }
}

/// Deterministic [`Entropy`] that always lands on the same point of every
/// range.
///
/// `fraction` picks the point (`0.0` = low end, `1.0` = high end) and
/// `hits` is the answer to every [`Entropy::chance`] call. With
/// [`FixedEntropy::maximum`] a climb step is exactly 50 m and a descent
/// step exactly 30 m.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedEntropy {
    fraction: f64,
    hits: bool,
}

impl FixedEntropy {
    /// Land at `fraction` of every range (clamped to `0.0..=1.0`) and
    /// answer every coin flip with `hits`.
    pub fn new(fraction: f64, hits: bool) -> Self {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        Self { fraction, hits }
    }

    /// Every draw returns the top of its range; no coin flip succeeds.
    pub const fn maximum() -> Self {
        Self {
            fraction: 1.0,
            hits: false,
        }
    }

    /// Every draw returns the bottom of its range; no coin flip succeeds.
    pub const fn minimum() -> Self {
        Self {
            fraction: 0.0,
            hits: false,
        }
    }

    /// Same draws, with every coin flip answered by `hits`.
    #[must_use]
    pub const fn with_hits(self, hits: bool) -> Self {
        Self {
            fraction: self.fraction,
            hits,
        }
    }
}

impl Entropy for FixedEntropy {
    fn chance(&mut self, _probability: f64) -> bool {
        self.hits
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high > low {
            (high - low).mul_add(self.fraction, low)
        } else {
            low
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn uniform_int(&mut self, low: u8, high: u8) -> u8 {
        if high <= low {
            return low;
        }
        let span = f64::from(high.saturating_sub(low));
        // fraction is clamped to 0..=1, so the offset fits in span.
        let offset = (span * self.fraction).round() as u8;
        low.saturating_add(offset)
    }
}
