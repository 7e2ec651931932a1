use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, SystemState};

/// Statistical counters of a run.
///
/// The two areas are integrals of step functions over simulated time: the number in queue, and
/// the server-busy indicator. They must be brought up to date with [`advance`](Self::advance)
/// before the state changes, so that each interval is weighted by the state that held during it.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Accumulator {
    area_queue_length: f64,
    area_server_busy: f64,
    total_delay: f64,
    number_delayed: u64,
    time_of_last_update: f64,
}

impl Accumulator {
    /// Integrates the current state over the time elapsed since the last update.
    pub fn advance(&mut self, now: f64, state: &SystemState) {
        let elapsed = now - self.time_of_last_update;
        debug_assert!(elapsed >= 0.0, "time went backwards by {}", -elapsed);
        self.time_of_last_update = now;
        self.area_queue_length += state.queue_length() as f64 * elapsed;
        self.area_server_busy += state.server_status().indicator() * elapsed;
    }

    /// Registers a customer who has just begun service after waiting for `delay`.
    pub fn record_delay(&mut self, delay: f64) {
        self.total_delay += delay;
        self.number_delayed += 1;
    }

    /// Area under the number-in-queue function.
    #[must_use]
    pub fn area_queue_length(&self) -> f64 {
        self.area_queue_length
    }

    /// Area under the server-busy indicator function.
    #[must_use]
    pub fn area_server_busy(&self) -> f64 {
        self.area_server_busy
    }

    /// Sum of the delays of all customers who have begun service.
    #[must_use]
    pub fn total_delay(&self) -> f64 {
        self.total_delay
    }

    /// Number of customers who have begun service.
    #[must_use]
    pub fn number_delayed(&self) -> u64 {
        self.number_delayed
    }

    /// Time of the most recent [`advance`](Self::advance).
    #[must_use]
    pub fn time_of_last_update(&self) -> f64 {
        self.time_of_last_update
    }

    /// Computes the summary measures at time `now`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateReport`] when no customer has been delayed yet, or when `now`
    /// is zero, since the averages are undefined then.
    pub fn report(&self, now: f64) -> Result<Report> {
        if self.number_delayed == 0 || now <= 0.0 {
            return Err(Error::DegenerateReport {
                number_delayed: self.number_delayed,
                time: now,
            });
        }
        Ok(Report {
            mean_delay: self.total_delay / self.number_delayed as f64,
            mean_queue_length: self.area_queue_length / now,
            utilization: self.area_server_busy / now,
            final_time: now,
            customers_delayed: self.number_delayed,
        })
    }
}

/// Summary measures of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Average delay in queue.
    pub mean_delay: f64,
    /// Time-average number in queue.
    pub mean_queue_length: f64,
    /// Fraction of time the server was busy.
    pub utilization: f64,
    /// Simulation time at the end of the run.
    pub final_time: f64,
    /// Number of customers who have begun service.
    pub customers_delayed: u64,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Average delay in queue {:.3}", self.mean_delay)?;
        writeln!(f)?;
        writeln!(f, "Average number in queue {:.3}", self.mean_queue_length)?;
        writeln!(f)?;
        writeln!(f, "Server utilization {:.3}", self.utilization)?;
        writeln!(f)?;
        writeln!(f, "Time simulation ended {:.3}", self.final_time)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::approx_eq;
    use quickcheck_macros::quickcheck;
    use rstest::{fixture, rstest};

    #[fixture]
    fn accumulator() -> Accumulator {
        Accumulator::default()
    }

    #[rstest]
    fn test_degenerate(accumulator: Accumulator) {
        assert_eq!(
            accumulator.report(10.0),
            Err(Error::DegenerateReport {
                number_delayed: 0,
                time: 10.0
            })
        );
        let mut accumulator = accumulator;
        accumulator.record_delay(0.0);
        assert_eq!(
            accumulator.report(0.0),
            Err(Error::DegenerateReport {
                number_delayed: 1,
                time: 0.0
            })
        );
    }

    #[rstest]
    fn test_integrates_previous_state(mut accumulator: Accumulator) {
        let mut state = SystemState::new(10);
        accumulator.advance(1.0, &state);
        state.seize();
        accumulator.advance(3.0, &state);
        state.enqueue(3.0).unwrap();
        state.enqueue(3.5).unwrap();
        accumulator.advance(4.0, &state);
        state.dequeue();
        accumulator.advance(6.0, &state);
        state.dequeue();
        state.release();
        accumulator.advance(7.0, &state);

        // Busy over [1, 6], two waiting over [3, 4], one over [4, 6], none after.
        assert_eq!(accumulator.area_server_busy(), 5.0);
        assert_eq!(accumulator.area_queue_length(), 4.0);
        assert_eq!(accumulator.time_of_last_update(), 7.0);
    }

    #[rstest]
    fn test_report(mut accumulator: Accumulator) {
        let mut state = SystemState::new(10);
        state.seize();
        state.enqueue(0.0).unwrap();
        accumulator.advance(4.0, &state);
        accumulator.record_delay(0.0);
        accumulator.record_delay(3.0);
        let report = accumulator.report(8.0).unwrap();
        assert!(approx_eq!(f64, report.mean_delay, 1.5));
        assert!(approx_eq!(f64, report.mean_queue_length, 0.5));
        assert!(approx_eq!(f64, report.utilization, 0.5));
        assert_eq!(report.final_time, 8.0);
        assert_eq!(report.customers_delayed, 2);
        assert_eq!(
            report.to_string(),
            "Average delay in queue 1.500\n\n\
             Average number in queue 0.500\n\n\
             Server utilization 0.500\n\n\
             Time simulation ended 8.000\n"
        );
    }

    #[quickcheck]
    fn areas_match_riemann_sum(steps: Vec<(u8, u8, bool)>) -> bool {
        let mut accumulator = Accumulator::default();
        let mut state = SystemState::new(usize::from(u8::MAX));
        let mut now = 0.0;
        let mut expected_queue = 0.0;
        let mut expected_busy = 0.0;
        for (dt, len, busy) in steps {
            let dt = f64::from(dt) / 4.0;
            now += dt;
            expected_queue += state.queue_length() as f64 * dt;
            expected_busy += state.server_status().indicator() * dt;
            let previous = (accumulator.area_queue_length(), accumulator.area_server_busy());
            accumulator.advance(now, &state);
            if accumulator.area_queue_length() < previous.0
                || accumulator.area_server_busy() < previous.1
            {
                return false;
            }
            while state.queue_length() > usize::from(len) {
                state.dequeue();
            }
            while state.queue_length() < usize::from(len) {
                state.enqueue(now).unwrap();
            }
            if busy {
                state.seize();
            } else {
                state.release();
            }
        }
        approx_eq!(f64, accumulator.area_queue_length(), expected_queue, ulps = 4)
            && approx_eq!(f64, accumulator.area_server_busy(), expected_busy, ulps = 4)
    }
}
