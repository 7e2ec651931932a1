//! Random variates consumed by the simulation.
//!
//! The simulation never talks to a random number generator directly. Instead, it pulls uniform
//! draws from a [`UniformSource`], which makes it possible to replay a run from a recorded
//! sequence of draws:
//!
//! ```
//! # use ssqsim::{Recorder, RngSource, RunParameters, Simulation};
//! # fn main() -> ssqsim::Result<()> {
//! let params = RunParameters::new(1.0, 0.5, 100.0)?;
//! let mut original = Simulation::new(params.clone(), Recorder::new(RngSource::seeded(3)));
//! let report = original.run()?;
//! let replay = original.into_source().into_replay();
//! assert_eq!(Simulation::new(params, replay).run()?, report);
//! # Ok(())
//! # }
//! ```

use rand::distributions::Open01;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{Error, Result};

/// Produces successive uniform draws from the interval `(0, 1]`.
pub trait UniformSource {
    /// Returns the next draw, or `None` if the source has run out of values.
    fn next_uniform(&mut self) -> Option<f64>;
}

impl<S: UniformSource + ?Sized> UniformSource for &mut S {
    fn next_uniform(&mut self) -> Option<f64> {
        (**self).next_uniform()
    }
}

/// Uniform source backed by a random number generator.
/// Draws never hit either end of the unit interval.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    /// Wraps a random number generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<ChaCha8Rng> {
    /// Generator with a fixed seed; two sources with equal seeds produce equal draws.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Generator seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> UniformSource for RngSource<R> {
    fn next_uniform(&mut self) -> Option<f64> {
        Some(self.rng.sample(Open01))
    }
}

/// Replays a fixed sequence of draws, and then runs out.
#[derive(Debug, Clone)]
pub struct Replay {
    draws: std::vec::IntoIter<f64>,
}

impl Replay {
    /// Creates a source returning `draws` in order.
    pub fn new<I: IntoIterator<Item = f64>>(draws: I) -> Self {
        Self {
            draws: draws.into_iter().collect::<Vec<_>>().into_iter(),
        }
    }

    /// Number of draws not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl UniformSource for Replay {
    fn next_uniform(&mut self) -> Option<f64> {
        self.draws.next()
    }
}

/// Passes draws through from another source while keeping a copy of each.
#[derive(Debug, Clone)]
pub struct Recorder<S> {
    inner: S,
    draws: Vec<f64>,
}

impl<S: UniformSource> Recorder<S> {
    /// Starts recording draws of `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            draws: Vec::new(),
        }
    }

    /// All draws handed out so far.
    #[must_use]
    pub fn draws(&self) -> &[f64] {
        &self.draws
    }

    /// Source that will hand out the recorded draws again.
    #[must_use]
    pub fn into_replay(self) -> Replay {
        Replay::new(self.draws)
    }
}

impl<S: UniformSource> UniformSource for Recorder<S> {
    fn next_uniform(&mut self) -> Option<f64> {
        let draw = self.inner.next_uniform()?;
        self.draws.push(draw);
        Some(draw)
    }
}

/// Draws an exponentially distributed duration with the given mean: `-mean * ln(u)`.
///
/// Consumes exactly one draw from `source`.
///
/// # Errors
///
/// Returns [`Error::SourceExhausted`] if `source` has no more draws, and
/// [`Error::InvalidUniform`] if the draw is not in `(0, 1]`; a zero draw would yield an
/// infinite duration.
pub fn exponential<S: UniformSource + ?Sized>(source: &mut S, mean: f64) -> Result<f64> {
    let u = source.next_uniform().ok_or(Error::SourceExhausted)?;
    if u > 0.0 && u <= 1.0 {
        Ok(-mean * u.ln())
    } else {
        Err(Error::InvalidUniform(u))
    }
}
