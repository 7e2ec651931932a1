//! Helpers shared by the tests of the workspace crates.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A generator with a fixed seed, so that tests are reproducible.
#[must_use]
pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Returns the uniform draw `u` for which `-mean * ln(u)` equals `duration`.
///
/// This is meant for scripting event times: a sequence of these draws makes an exponential
/// variate generator produce the given durations, up to rounding.
///
/// ```
/// let u = testing::uniform_for(2.0, 0.5);
/// assert!((-0.5 * u.ln() - 2.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn uniform_for(duration: f64, mean: f64) -> f64 {
    (-duration / mean).exp()
}

/// Maps each `(duration, mean)` pair with [`uniform_for`].
#[must_use]
pub fn uniforms_for(steps: &[(f64, f64)]) -> Vec<f64> {
    steps
        .iter()
        .map(|&(duration, mean)| uniform_for(duration, mean))
        .collect()
}
