//! Discrete-event simulation of a single-server queue with a first-come-first-served discipline.
//!
//! Customers arrive at exponentially distributed intervals and wait in a bounded line whenever
//! the server is busy. The simulation advances from one event to the next, integrating the number
//! in queue and the server-busy indicator over simulated time, and stops once the required number
//! of customers have begun service.
//!
//! # Examples
//!
//! ```
//! # use ssqsim::{RngSource, RunParameters, Simulation};
//! # fn main() -> ssqsim::Result<()> {
//! let params = RunParameters::new(1.0, 0.5, 1000.0)?;
//! let mut simulation = Simulation::new(params, RngSource::seeded(17));
//! let report = simulation.run()?;
//! assert!(report.utilization > 0.0 && report.utilization < 1.0);
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::cast_precision_loss
)]
#![deny(unsafe_code)]

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

mod calendar;
pub use calendar::{Calendar, EventKind, IDLE_TIME};

mod config;
pub use config::RunParameters;

mod handlers;

mod simulation;
pub use simulation::{Phase, Simulation};

mod state;
pub use state::{ServerStatus, SystemState, WaitingLine, Q_LIMIT};

mod stats;
pub use stats::{Accumulator, Report};

mod trace;
pub use trace::{write_from_channel, TraceRecord};

pub mod variate;
pub use variate::{exponential, Recorder, Replay, RngSource, UniformSource};

/// Error type encompassing all the ways a simulation run can terminate abnormally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// No event is pending, so the clock cannot advance.
    #[error("Event list is empty at time {time}")]
    CalendarEmpty {
        /// Simulation time at which the calendar was found empty.
        time: f64,
    },
    /// A customer arrived at a busy server while the waiting line was full.
    #[error("Overflow of the waiting line (capacity {capacity}) at time {time}")]
    QueueOverflow {
        /// Simulation time of the rejected arrival.
        time: f64,
        /// Capacity of the waiting line.
        capacity: usize,
    },
    /// Statistics were requested before they can be defined.
    #[error("Statistics are undefined with {number_delayed} customers delayed at time {time}")]
    DegenerateReport {
        /// Number of customers that have begun service.
        number_delayed: u64,
        /// Simulation time of the request.
        time: f64,
    },
    /// Run parameters were rejected before initialization.
    #[error("Invalid run parameters: {0}")]
    InvalidParameters(String),
    /// The uniform source has no more draws.
    #[error("Uniform source is exhausted")]
    SourceExhausted,
    /// The uniform source produced a value outside of `(0, 1]`.
    #[error("Uniform draw outside of (0, 1]: {0}")]
    InvalidUniform(f64),
    /// A step was requested from a run that has already completed or aborted.
    #[error("Simulation is not running ({0})")]
    NotRunning(Phase),
}

/// Result alias using [`Error`](enum.Error.html).
pub type Result<T> = std::result::Result<T, Error>;

/// Sequential number of a customer, counted separately for arrivals and departures.
#[derive(
    From,
    Into,
    Debug,
    Default,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Hash,
    Display,
)]
pub struct CustomerId(usize);
