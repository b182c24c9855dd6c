//! Sampling primitives.
//!
//! - [`weighted_choice`]: pick an index proportionally to non-negative weights
//! - [`softmax_choice`]: pick the rating closest to a reference, softly
//! - [`uniform_choice`] / [`uniform_index`]: pick uniformly by `u32` modulo
//! - [`random_bit`]: 0 or 1
//!
//! Every function takes the [`RandomSource`] explicitly; none of them keep state.

use crate::error::{Result, WalkError};
use crate::random::RandomSource;

/// Pick an index with probability proportional to its weight
///
/// ## Algorithm
/// 1. Normalize the weights by their sum
/// 2. Draw one value `r` in `[0, 1)`
/// 3. Walk the positive weights subtracting each from `r`; return the first
///    index where `r <= 0`
/// 4. If rounding leaves `r` slightly positive after the last weight, return
///    the last index with positive weight
///
/// A zero-weight index is never returned. Fails if `weights` is empty, holds a
/// negative or NaN weight, or does not sum to a positive finite value.
pub fn weighted_choice<R: RandomSource + ?Sized>(weights: &[f64], rng: &mut R) -> Result<usize> {
    if weights.is_empty() {
        return Err(WalkError::EmptyChoice("weights"));
    }

    let sum: f64 = weights.iter().sum();
    let non_negative = weights.iter().all(|&w| w >= 0.0);
    if !(non_negative && sum > 0.0 && sum.is_finite()) {
        return Err(WalkError::DegenerateWeights { sum });
    }

    let mut remainder = rng.unit();
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w == 0.0 {
            continue;
        }
        last_positive = i;
        remainder -= w / sum;
        if remainder <= 0.0 {
            return Ok(i);
        }
    }

    // Floating-point residue: the draw landed past the accumulated mass
    Ok(last_positive)
}

/// Weights `exp(-|candidate - reference|)`, rescaled so the closest candidate
/// scores exactly 1.0
///
/// The rescale is a common factor `exp(min distance)`, so the normalized
/// distribution is unchanged, but weights never all underflow to zero when
/// every candidate is far from the reference.
pub fn similarity_weights(reference: f64, candidates: &[f64]) -> Vec<f64> {
    let distances: Vec<f64> = candidates.iter().map(|&c| (c - reference).abs()).collect();
    let nearest = distances.iter().copied().fold(f64::INFINITY, f64::min);
    distances.iter().map(|&d| (nearest - d).exp()).collect()
}

/// Pick an index biased toward ratings close to `reference`
pub fn softmax_choice<R: RandomSource + ?Sized>(
    reference: f64,
    candidates: &[f64],
    rng: &mut R,
) -> Result<usize> {
    weighted_choice(&similarity_weights(reference, candidates), rng)
}

/// Uniform index into a collection of `len` items (`next_u32() mod len`)
pub fn uniform_index<R: RandomSource + ?Sized>(len: usize, rng: &mut R) -> Result<usize> {
    if len == 0 {
        return Err(WalkError::EmptyChoice("options"));
    }
    Ok(rng.next_u32() as usize % len)
}

/// Uniformly pick one element of a non-empty slice
pub fn uniform_choice<'a, T, R: RandomSource + ?Sized>(options: &'a [T], rng: &mut R) -> Result<&'a T> {
    let i = uniform_index(options.len(), rng)?;
    Ok(&options[i])
}

/// Fair coin, 0 or 1
pub fn random_bit<R: RandomSource + ?Sized>(rng: &mut R) -> usize {
    (rng.next_u32() % 2) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedSource, WalkRng};

    #[test]
    fn test_weighted_choice_degenerate_one_hot() {
        let mut rng = WalkRng::seed_from_u64(3);
        for _ in 0..200 {
            assert_eq!(weighted_choice(&[1.0, 0.0, 0.0], &mut rng).unwrap(), 0);
            assert_eq!(weighted_choice(&[0.0, 0.0, 1.0], &mut rng).unwrap(), 2);
        }
    }

    #[test]
    fn test_weighted_choice_zero_draw_skips_empty_buckets() {
        let mut rng = ScriptedSource::new(&[0.0, 0.0], &[]);
        assert_eq!(weighted_choice(&[0.0, 0.0, 1.0], &mut rng).unwrap(), 2);
        assert_eq!(weighted_choice(&[0.0, 0.3, 0.7], &mut rng).unwrap(), 1);
    }

    #[test]
    fn test_weighted_choice_buckets() {
        // Normalized buckets: [0, 0.5], (0.5, 0.6], (0.6, 1.0)
        let weights = [0.5, 0.1, 0.4];
        let mut rng = ScriptedSource::new(&[0.0, 0.5, 0.55, 0.61, 0.99], &[]);

        let picks: Vec<usize> = (0..5)
            .map(|_| weighted_choice(&weights, &mut rng).unwrap())
            .collect();
        assert_eq!(picks, vec![0, 0, 1, 2, 2]);
    }

    #[test]
    fn test_weighted_choice_unnormalized() {
        let mut rng = ScriptedSource::new(&[0.3, 0.8], &[]);
        assert_eq!(weighted_choice(&[2.0, 6.0], &mut rng).unwrap(), 1);
        assert_eq!(weighted_choice(&[2.0, 6.0], &mut rng).unwrap(), 1);
    }

    #[test]
    fn test_weighted_choice_residue_falls_to_last_positive() {
        // A remainder that survives every subtraction lands on the last
        // index that carries weight
        let mut rng = ScriptedSource::new(&[1.5, 1.5], &[]);
        assert_eq!(weighted_choice(&[1.0, 3.0, 0.0], &mut rng).unwrap(), 1);
        assert_eq!(weighted_choice(&[1.0, 3.0, 2.0], &mut rng).unwrap(), 2);
    }

    #[test]
    fn test_weighted_choice_rejects_bad_input() {
        let mut rng = WalkRng::seed_from_u64(0);
        assert!(matches!(
            weighted_choice(&[], &mut rng),
            Err(WalkError::EmptyChoice(_))
        ));
        assert!(matches!(
            weighted_choice(&[0.0, 0.0], &mut rng),
            Err(WalkError::DegenerateWeights { .. })
        ));
        assert!(matches!(
            weighted_choice(&[-1.0, 0.5], &mut rng),
            Err(WalkError::DegenerateWeights { .. })
        ));
        assert!(weighted_choice(&[f64::NAN, 1.0], &mut rng).is_err());
    }

    #[test]
    fn test_similarity_weights_peak_at_reference() {
        let w = similarity_weights(4.0, &[4.0, 3.5, 1.0, 3.0, 5.0]);
        assert_eq!(w[0], 1.0);
        assert!(w[1] < 1.0);
        assert!(w[2] < w[1]);
        assert_eq!(w[3], w[4]);
    }

    #[test]
    fn test_similarity_weights_far_from_reference() {
        // exp(-1000) underflows; the nearest candidate must still score 1
        let w = similarity_weights(0.0, &[1000.0, 1001.0]);
        assert_eq!(w[0], 1.0);
        assert!((w[1] - (-1.0f64).exp()).abs() < 1e-12);
        assert!(similarity_weights(0.0, &[]).is_empty());
    }

    #[test]
    fn test_softmax_far_ratings_still_choose() {
        let mut rng = ScriptedSource::new(&[0.5, 0.9], &[]);
        assert_eq!(softmax_choice(0.0, &[1000.0], &mut rng).unwrap(), 0);
        // weights 1 and e^-1: the first bucket covers ~0.73 of the mass
        assert_eq!(softmax_choice(0.0, &[1000.0, 1001.0], &mut rng).unwrap(), 1);
    }

    #[test]
    fn test_softmax_prefers_matching_rating() {
        let ratings = [1.0, 4.0, 2.5, 5.0];
        let mut rng = WalkRng::seed_from_u64(11);
        let mut counts = [0usize; 4];
        for _ in 0..20_000 {
            counts[softmax_choice(4.0, &ratings, &mut rng).unwrap()] += 1;
        }

        // The exact match has weight 1, every other candidate less
        for (i, &c) in counts.iter().enumerate() {
            if i != 1 {
                assert!(counts[1] > c, "counts = {:?}", counts);
            }
        }
    }

    #[test]
    fn test_softmax_single_candidate() {
        let mut rng = WalkRng::seed_from_u64(5);
        assert_eq!(softmax_choice(1.0, &[5.0], &mut rng).unwrap(), 0);
        assert!(softmax_choice(1.0, &[], &mut rng).is_err());
    }

    #[test]
    fn test_uniform_choice_is_modulo() {
        let options = ['a', 'b', 'c'];
        let mut rng = ScriptedSource::new(&[], &[0, 4, 8, u32::MAX]);

        assert_eq!(*uniform_choice(&options, &mut rng).unwrap(), 'a');
        assert_eq!(*uniform_choice(&options, &mut rng).unwrap(), 'b');
        assert_eq!(*uniform_choice(&options, &mut rng).unwrap(), 'c');
        // u32::MAX = 4294967295 = 3 * 1431655765
        assert_eq!(*uniform_choice(&options, &mut rng).unwrap(), 'a');
    }

    #[test]
    fn test_uniform_choice_empty() {
        let mut rng = WalkRng::seed_from_u64(0);
        let empty: [u32; 0] = [];
        assert!(matches!(
            uniform_choice(&empty, &mut rng),
            Err(WalkError::EmptyChoice(_))
        ));
    }

    #[test]
    fn test_random_bit() {
        let mut rng = ScriptedSource::new(&[], &[6, 7]);
        assert_eq!(random_bit(&mut rng), 0);
        assert_eq!(random_bit(&mut rng), 1);
    }
}
