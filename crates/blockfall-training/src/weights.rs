//! Flat parameter vector operations used by the network's genetic operators.
//!
//! - **Initialization**: [`random`] draws every value uniformly from `[-1, 1]`
//! - **Crossover**: [`uniform_crossover`] takes each value from either parent with
//!   probability 0.5
//! - **Mutation**: [`mutate`] adds `0.5 × N(0, 1)` noise to each value with probability
//!   `rate`
//!
//! Every function takes the random source as an argument, so a seeded generator makes
//! the result reproducible.

use rand::Rng;
use rand_distr::StandardNormal;

/// Scale applied to the standard-normal perturbation in [`mutate`].
pub const MUTATION_SCALE: f32 = 0.5;

/// Creates a vector by applying a function to each index.
///
/// ```
/// use blockfall_training::weights;
///
/// let values = weights::from_fn(|i| i as f32 * 0.5, 3);
/// assert_eq!(values, vec![0.0, 0.5, 1.0]);
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

/// Generates `len` values independently and uniformly distributed in `[-1, 1]`.
pub fn random<R>(rng: &mut R, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    from_fn(|_| rng.random_range(-1.0..=1.0), len)
}

/// Builds a child vector taking each entry from `p1` or `p2` with equal probability.
///
/// # Panics
///
/// Panics if the parents have different lengths.
pub fn uniform_crossover<R>(p1: &[f32], p2: &[f32], rng: &mut R) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    assert_eq!(p1.len(), p2.len());
    from_fn(
        |i| if rng.random_bool(0.5) { p1[i] } else { p2[i] },
        p1.len(),
    )
}

/// Perturbs values in place.
///
/// Each value, independently with probability `rate` (clamped to `[0, 1]`), gets
/// `MUTATION_SCALE × N(0, 1)` added to it.
pub fn mutate<R>(values: &mut [f32], rate: f32, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let rate = f64::from(rate.clamp(0.0, 1.0));
    for v in values {
        if rng.random_bool(rate) {
            let noise: f32 = rng.sample(StandardNormal);
            *v += noise * MUTATION_SCALE;
        }
    }
}
