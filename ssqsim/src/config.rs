//! Run parameters loaded from input files.

use std::convert::TryFrom;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Q_LIMIT};

/// Parameters of a single simulation run. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameters")]
pub struct RunParameters {
    mean_interarrival: f64,
    mean_service: f64,
    required_delays: u64,
    queue_limit: usize,
}

/// Parameters as they come in, before validation.
#[derive(Deserialize)]
struct RawParameters {
    mean_interarrival: f64,
    mean_service: f64,
    required_delays: f64,
    #[serde(default = "default_queue_limit")]
    queue_limit: usize,
}

fn default_queue_limit() -> usize {
    Q_LIMIT
}

impl TryFrom<RawParameters> for RunParameters {
    type Error = Error;
    fn try_from(raw: RawParameters) -> Result<Self> {
        Self::new(raw.mean_interarrival, raw.mean_service, raw.required_delays)?
            .with_queue_limit(raw.queue_limit)
    }
}

fn ensure_positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidParameters(format!(
            "{} must be a positive number ({})",
            name, value
        )))
    }
}

impl RunParameters {
    /// Validates the parameters, with the default waiting line capacity of [`Q_LIMIT`].
    ///
    /// The required number of delays may be fractional; the run lasts until the number of
    /// delayed customers reaches it, so it is rounded up.
    ///
    /// ```
    /// # use ssqsim::RunParameters;
    /// # fn main() -> ssqsim::Result<()> {
    /// assert_eq!(RunParameters::new(1.0, 0.5, 999.5)?.required_delays(), 1000);
    /// assert!(RunParameters::new(1.0, 0.0, 10.0).is_err());
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] if any value is not a positive finite number.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(mean_interarrival: f64, mean_service: f64, required_delays: f64) -> Result<Self> {
        let required_delays = ensure_positive("required number of delays", required_delays)?;
        if required_delays > u64::MAX as f64 {
            return Err(Error::InvalidParameters(format!(
                "required number of delays is too large ({})",
                required_delays
            )));
        }
        Ok(Self {
            mean_interarrival: ensure_positive("mean interarrival time", mean_interarrival)?,
            mean_service: ensure_positive("mean service time", mean_service)?,
            required_delays: required_delays.ceil() as u64,
            queue_limit: Q_LIMIT,
        })
    }

    /// Changes the capacity of the waiting line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] if `queue_limit` is zero.
    pub fn with_queue_limit(mut self, queue_limit: usize) -> Result<Self> {
        if queue_limit == 0 {
            return Err(Error::InvalidParameters(String::from(
                "queue limit must be at least 1",
            )));
        }
        self.queue_limit = queue_limit;
        Ok(self)
    }

    /// Parses the three whitespace-separated numbers of an input file: mean interarrival time,
    /// mean service time, and required number of delays.
    ///
    /// ```
    /// # use ssqsim::RunParameters;
    /// # fn main() -> ssqsim::Result<()> {
    /// let params = RunParameters::from_text("1.0 0.5 1000\n")?;
    /// assert_eq!(params.mean_interarrival(), 1.0);
    /// assert_eq!(params.mean_service(), 0.5);
    /// assert_eq!(params.required_delays(), 1000);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] if there are not exactly three numbers, or they fail
    /// validation.
    pub fn from_text(input: &str) -> Result<Self> {
        let values = input
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|err| {
                    Error::InvalidParameters(format!("cannot parse `{}`: {}", token, err))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        match values[..] {
            [mean_interarrival, mean_service, required_delays] => {
                Self::new(mean_interarrival, mean_service, required_delays)
            }
            _ => Err(Error::InvalidParameters(format!(
                "expected 3 values but found {}",
                values.len()
            ))),
        }
    }

    /// Loads the parameters from JSON.
    ///
    /// ```
    /// # use ssqsim::RunParameters;
    /// # fn main() -> ssqsim::Result<()> {
    /// let input = r#"{"mean_interarrival": 2.0, "mean_service": 1.5, "required_delays": 50}"#;
    /// let params = RunParameters::from_json(input.as_bytes())?;
    /// assert_eq!(params.queue_limit(), ssqsim::Q_LIMIT);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] if the input cannot be parsed or fails validation.
    pub fn from_json<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader)
            .map_err(|err| Error::InvalidParameters(format!("cannot parse JSON: {}", err)))
    }

    /// Mean time between consecutive arrivals.
    #[must_use]
    pub fn mean_interarrival(&self) -> f64 {
        self.mean_interarrival
    }

    /// Mean service time.
    #[must_use]
    pub fn mean_service(&self) -> f64 {
        self.mean_service
    }

    /// Number of customers that must begin service before the run stops.
    #[must_use]
    pub fn required_delays(&self) -> u64 {
        self.required_delays
    }

    /// Capacity of the waiting line.
    #[must_use]
    pub fn queue_limit(&self) -> usize {
        self.queue_limit
    }
}

impl FromStr for RunParameters {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

/// Report heading echoing the parameters.
impl fmt::Display for RunParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Single-server queueing system")?;
        writeln!(f, "------------------------------")?;
        writeln!(f)?;
        writeln!(
            f,
            "Mean interarrival time   -> {:?} minutes",
            self.mean_interarrival
        )?;
        writeln!(f)?;
        writeln!(f, "Mean service time        -> {:?} minutes", self.mean_service)?;
        writeln!(f)?;
        writeln!(f, "Number of customers      -> {}", self.required_delays)
    }
}
