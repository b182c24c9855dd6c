//! Random sources for walk generation.
//!
//! Sampling code draws through the small [`RandomSource`] trait instead of
//! `rand::Rng` directly. That keeps the exact draw sequence explicit (one
//! `unit()` per weighted pick, one `next_u32()` per uniform pick) and lets
//! tests script every branch of the metapath policy.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The two kinds of draw the walk engine makes
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`
    fn unit(&mut self) -> f64;

    /// Uniform draw over the full `u32` range
    fn next_u32(&mut self) -> u32;
}

impl<S: RandomSource + ?Sized> RandomSource for &mut S {
    fn unit(&mut self) -> f64 {
        (**self).unit()
    }

    fn next_u32(&mut self) -> u32 {
        (**self).next_u32()
    }
}

/// Seeded ChaCha8 stream used for real walk generation
#[derive(Debug, Clone)]
pub struct WalkRng {
    inner: ChaCha8Rng,
}

impl WalkRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Independent stream for one unit of work (e.g. one user) under a base seed
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        Self::seed_from_u64(mix64(seed ^ mix64(stream)))
    }
}

impl RandomSource for WalkRng {
    fn unit(&mut self) -> f64 {
        self.inner.random::<f64>()
    }

    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }
}

/// Fresh base seed from the OS entropy source
pub fn entropy_seed() -> u64 {
    rand::rng().random()
}

/// SplitMix64 finalizer
fn mix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Replays fixed draws; used to force specific branches in tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedSource {
    units: std::collections::VecDeque<f64>,
    ints: std::collections::VecDeque<u32>,
    pub(crate) units_drawn: usize,
    pub(crate) ints_drawn: usize,
}

#[cfg(test)]
impl ScriptedSource {
    pub(crate) fn new(units: &[f64], ints: &[u32]) -> Self {
        Self {
            units: units.iter().copied().collect(),
            ints: ints.iter().copied().collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedSource {
    /// Panics once the script runs out
    fn unit(&mut self) -> f64 {
        self.units_drawn += 1;
        self.units
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted unit draw #{}", self.units_drawn))
    }

    /// Panics once the script runs out
    fn next_u32(&mut self) -> u32 {
        self.ints_drawn += 1;
        self.ints
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted u32 draw #{}", self.ints_drawn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = WalkRng::seed_from_u64(7);
        let mut b = WalkRng::seed_from_u64(7);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_streams_differ() {
        let mut a = WalkRng::for_stream(7, 0);
        let mut b = WalkRng::for_stream(7, 1);
        let xs: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_scripted_source_replays_in_order() {
        let mut rng = ScriptedSource::new(&[0.25], &[3, 9]);
        assert_eq!(rng.unit(), 0.25);
        assert_eq!(rng.next_u32(), 3);
        assert_eq!(rng.next_u32(), 9);
        assert_eq!((rng.units_drawn, rng.ints_drawn), (1, 2));
    }

    #[test]
    #[should_panic(expected = "unscripted unit draw")]
    fn test_scripted_source_panics_when_exhausted() {
        let mut rng = ScriptedSource::new(&[0.5], &[]);
        rng.unit();
        rng.unit();
    }

    #[test]
    fn test_unit_range() {
        let mut rng = WalkRng::seed_from_u64(1);
        for _ in 0..1000 {
            let u = rng.unit();
            assert!((0.0..1.0).contains(&u));
        }
    }
}
