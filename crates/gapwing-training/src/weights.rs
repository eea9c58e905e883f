//! Weight vector operations for the genetic algorithm.
//!
//! These are the building blocks [`PopulationEvolver`](crate::genetic::PopulationEvolver)
//! uses to initialize, recombine and perturb network weights. Network weights are signed,
//! so every operation keeps values inside `[-max_weight, max_weight]`.
//!
//! # Operations
//!
//! - **Initialization**: [`random`] generates random weight vectors
//! - **Crossover**: [`blx_alpha`] implements the BLX-α crossover operator
//! - **Mutation**: [`mutate`] applies Gaussian mutation

use rand::Rng;
use rand_distr::{Normal, NormalError};

/// Creates a weight vector by applying a function to each index.
///
/// # Examples
///
/// ```
/// use gapwing_training::weights;
///
/// let weights = weights::from_fn(|i| 1.0 / (i as f32 + 1.0), 4);
/// assert_eq!(weights, vec![1.0, 0.5, 1.0 / 3.0, 0.25]);
/// ```
pub fn from_fn<F>(mut f: F, len: usize) -> Vec<f32>
where
    F: FnMut(usize) -> f32,
{
    let mut values = Vec::with_capacity(len);
    for i in 0..len {
        values.push(f(i));
    }
    values
}

/// Generates `len` weights sampled uniformly from `[-max_weight, max_weight]`.
pub fn random<R>(rng: &mut R, max_weight: f32, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    from_fn(|_| rng.random_range(-max_weight..=max_weight), len)
}

/// Performs BLX-α (blend crossover) between two parent weight vectors.
///
/// For parents `x1` and `x2` at position `i`:
///
/// 1. Compute `d = |x2 - x1|`
/// 2. Expand the range to `[min - α·d, max + α·d]`
/// 3. Sample the child uniformly from the expanded range
/// 4. Clamp to `[-max_weight, max_weight]`
///
/// # Panics
///
/// Panics if parent vectors have different lengths.
pub fn blx_alpha<R>(p1: &[f32], p2: &[f32], alpha: f32, max_weight: f32, rng: &mut R) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    assert_eq!(p1.len(), p2.len());
    from_fn(
        |i| {
            let min = f32::min(p1[i], p2[i]);
            let max = f32::max(p1[i], p2[i]);
            let d = max - min;
            rng.random_range((min - alpha * d)..=(max + alpha * d))
                .clamp(-max_weight, max_weight)
        },
        p1.len(),
    )
}

/// Applies Gaussian mutation to a weight vector in place.
///
/// Each weight is perturbed with probability `rate` by a sample from `N(0, sigma)`, then
/// clamped to `[-max_weight, max_weight]`.
pub fn mutate<R>(
    weights: &mut [f32],
    sigma: f32,
    max_weight: f32,
    rate: f32,
    rng: &mut R,
) -> Result<(), NormalError>
where
    R: Rng + ?Sized,
{
    let normal = Normal::new(0.0, sigma)?;
    for w in weights {
        if rng.random_bool(rate.clamp(0.0, 1.0).into()) {
            *w = (*w + rng.sample(normal)).clamp(-max_weight, max_weight);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_random_stays_in_range() {
        let mut rng = Pcg32::seed_from_u64(1);
        let weights = random(&mut rng, 2.0, 200);
        assert_eq!(weights.len(), 200);
        assert!(weights.iter().all(|w| (-2.0..=2.0).contains(w)));
        assert!(weights.iter().any(|w| *w < 0.0));
    }

    #[test]
    fn test_blx_alpha_zero_stays_between_parents() {
        let mut rng = Pcg32::seed_from_u64(2);
        let p1 = [-1.0, 0.0, 0.5];
        let p2 = [1.0, 0.0, 0.75];
        for _ in 0..50 {
            let child = blx_alpha(&p1, &p2, 0.0, 5.0, &mut rng);
            assert!((-1.0..=1.0).contains(&child[0]));
            assert_eq!(child[1], 0.0);
            assert!((0.5..=0.75).contains(&child[2]));
        }
    }

    #[test]
    fn test_blx_alpha_clamps() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            let child = blx_alpha(&[-1.0], &[1.0], 2.0, 1.5, &mut rng);
            assert!((-1.5..=1.5).contains(&child[0]));
        }
    }

    #[test]
    fn test_mutate_rate_bounds() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut weights = vec![0.25; 32];
        mutate(&mut weights, 1.0, 5.0, 0.0, &mut rng).unwrap();
        assert!(weights.iter().all(|w| *w == 0.25));
        mutate(&mut weights, 1.0, 5.0, 1.0, &mut rng).unwrap();
        assert!(weights.iter().any(|w| *w != 0.25));
        assert!(weights.iter().all(|w| (-5.0..=5.0).contains(w)));
    }

    #[test]
    fn test_mutate_rejects_bad_sigma() {
        let mut rng = Pcg32::seed_from_u64(5);
        assert!(mutate(&mut [0.0], f32::NAN, 1.0, 1.0, &mut rng).is_err());
    }
}
