use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

use crate::{
    exponential, Accumulator, Calendar, CustomerId, Error, EventKind, Report, Result,
    RunParameters, SystemState, TraceRecord, UniformSource,
};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Created but the first arrival has not been scheduled yet.
    Uninitialized,
    /// Processing events.
    Running,
    /// The required number of customers have been delayed.
    Completed,
    /// Stopped by an error.
    Aborted,
}

/// The main simulation object, exclusively owning all the state of one run.
pub struct Simulation<S> {
    pub(crate) params: RunParameters,
    pub(crate) source: S,
    pub(crate) calendar: Calendar,
    pub(crate) state: SystemState,
    pub(crate) stats: Accumulator,
    phase: Phase,
    events: usize,
    pub(crate) arrivals: usize,
    pub(crate) departures: usize,
    trace_sender: Option<Sender<String>>,
}

impl<S: UniformSource> Simulation<S> {
    /// Creates a simulation drawing its random durations from `source`.
    pub fn new(params: RunParameters, source: S) -> Self {
        let state = SystemState::new(params.queue_limit());
        Self {
            params,
            source,
            calendar: Calendar::default(),
            state,
            stats: Accumulator::default(),
            phase: Phase::Uninitialized,
            events: 0,
            arrivals: 0,
            departures: 0,
            trace_sender: None,
        }
    }

    /// Register a sender receiving one line of text per processed event.
    #[must_use]
    pub fn trace_sender(mut self, sender: Sender<String>) -> Self {
        self.trace_sender = Some(sender);
        self
    }

    /// Resets the clock, state, and counters, and schedules the first arrival.
    ///
    /// # Errors
    ///
    /// Fails if the uniform source cannot provide the first interarrival time.
    pub fn initialize(&mut self) -> Result<()> {
        self.calendar = Calendar::default();
        self.state = SystemState::new(self.params.queue_limit());
        self.stats = Accumulator::default();
        self.events = 0;
        self.arrivals = 0;
        self.departures = 0;
        match exponential(&mut self.source, self.params.mean_interarrival()) {
            Ok(interarrival) => {
                let first = self.calendar.time() + interarrival;
                self.calendar.schedule_at(EventKind::Arrival, first);
                self.phase = Phase::Running;
                Ok(())
            }
            Err(err) => Err(self.abort(err)),
        }
    }

    /// Checks whether enough customers have begun service.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stats.number_delayed() >= self.params.required_delays()
    }

    /// Processes the next event: advances the clock, brings the time integrals up to date
    /// with the state that held until now, and runs the event's handler.
    /// Initializes the run first if needed.
    ///
    /// # Errors
    ///
    /// Any error aborts the run. Steps on a completed or aborted run return
    /// [`Error::NotRunning`].
    pub fn step(&mut self) -> Result<TraceRecord> {
        match self.phase {
            Phase::Uninitialized => self.initialize()?,
            Phase::Running => {}
            phase => return Err(Error::NotRunning(phase)),
        }
        match self.process_next() {
            Ok(record) => {
                log::debug!("[{:.3}] {}", record.time, record);
                self.send_trace(&record);
                Ok(record)
            }
            Err(err) => Err(self.abort(err)),
        }
    }

    /// Runs until the required number of customers have been delayed and reports the results.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the run, or [`Error::DegenerateReport`] if the run
    /// completed at time zero.
    pub fn run(&mut self) -> Result<Report> {
        if self.phase == Phase::Uninitialized {
            self.initialize()?;
        }
        log::info!(
            "Running until {} customers are delayed",
            self.params.required_delays()
        );
        while !self.is_complete() {
            self.step()?;
        }
        if self.phase == Phase::Running {
            self.phase = Phase::Completed;
            log::info!(
                "Completed after {} events at time {:.3}",
                self.events,
                self.calendar.time()
            );
        }
        self.report()
    }

    /// Summary measures at the current simulation time.
    ///
    /// # Errors
    ///
    /// See [`Accumulator::report`].
    pub fn report(&self) -> Result<Report> {
        self.stats.report(self.calendar.time())
    }

    fn process_next(&mut self) -> Result<TraceRecord> {
        let (kind, time) = self.calendar.select_next()?;
        self.stats.advance(time, &self.state);
        self.events += 1;
        let customer = match kind {
            EventKind::Arrival => {
                self.arrive()?;
                self.arrivals
            }
            EventKind::Departure => {
                self.depart()?;
                self.departures
            }
        };
        Ok(TraceRecord {
            index: self.events,
            kind,
            customer: CustomerId::from(customer),
            time,
            delayed: self.stats.number_delayed(),
        })
    }

    fn send_trace(&mut self, record: &TraceRecord) {
        let disconnected = match &self.trace_sender {
            Some(sender) => sender.send(record.entry()).is_err(),
            None => false,
        };
        if disconnected {
            log::warn!("Trace receiver disconnected; no more events will be traced");
            self.trace_sender = None;
        }
    }

    fn abort(&mut self, err: Error) -> Error {
        log::warn!("[{:.3}] Run aborted: {}", self.calendar.time(), err);
        self.phase = Phase::Aborted;
        err
    }
}

impl<S> Simulation<S> {
    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.calendar.time()
    }

    /// Parameters of this run.
    #[must_use]
    pub fn params(&self) -> &RunParameters {
        &self.params
    }

    /// The event calendar.
    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Server status and waiting line.
    #[must_use]
    pub fn state(&self) -> &SystemState {
        &self.state
    }

    /// Statistical counters.
    #[must_use]
    pub fn stats(&self) -> &Accumulator {
        &self.stats
    }

    /// Number of events processed so far.
    #[must_use]
    pub fn events_processed(&self) -> usize {
        self.events
    }

    /// Number of arrivals processed so far.
    #[must_use]
    pub fn arrivals(&self) -> usize {
        self.arrivals
    }

    /// Number of departures processed so far.
    #[must_use]
    pub fn departures(&self) -> usize {
        self.departures
    }

    /// Consumes the simulation, handing back the uniform source.
    pub fn into_source(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Replay, RngSource};
    use float_cmp::approx_eq;
    use rstest::rstest;
    use std::sync::mpsc;
    use testing::uniform_for;

    fn params(delays: f64) -> RunParameters {
        RunParameters::new(1.0, 1.0, delays).unwrap()
    }

    #[test]
    fn test_lifecycle() -> Result<()> {
        let mut sim = Simulation::new(params(3.0), RngSource::seeded(1));
        assert_eq!(sim.phase(), Phase::Uninitialized);
        assert!(!sim.calendar().is_scheduled(EventKind::Arrival));
        sim.initialize()?;
        assert_eq!(sim.phase(), Phase::Running);
        assert!(sim.calendar().is_scheduled(EventKind::Arrival));
        assert!(!sim.calendar().is_scheduled(EventKind::Departure));
        assert_eq!(sim.time(), 0.0);
        let report = sim.run()?;
        assert_eq!(sim.phase(), Phase::Completed);
        assert_eq!(report.customers_delayed, 3);
        assert_eq!(sim.step(), Err(Error::NotRunning(Phase::Completed)));
        assert_eq!(sim.run()?, report);
        Ok(())
    }

    #[test]
    fn test_step_initializes() -> Result<()> {
        let mut sim = Simulation::new(params(3.0), Replay::new(vec![uniform_for(2.0, 1.0); 3]));
        let record = sim.step()?;
        assert_eq!(sim.phase(), Phase::Running);
        assert_eq!(record.index, 1);
        assert_eq!(record.kind, EventKind::Arrival);
        assert_eq!(record.customer, CustomerId::from(1));
        assert!(approx_eq!(f64, record.time, 2.0, epsilon = 1e-9));
        assert_eq!(record.delayed, 1);
        Ok(())
    }

    #[rstest(draws, case(vec![]), case(vec![0.5, 0.5]))]
    fn test_exhausted_source_aborts(draws: Vec<f64>) {
        let mut sim = Simulation::new(params(5.0), Replay::new(draws));
        assert_eq!(sim.run(), Err(Error::SourceExhausted));
        assert_eq!(sim.phase(), Phase::Aborted);
        assert_eq!(sim.step(), Err(Error::NotRunning(Phase::Aborted)));
    }

    #[test]
    fn test_initialize_resets() -> Result<()> {
        let mut sim = Simulation::new(params(5.0), RngSource::seeded(9));
        sim.run()?;
        sim.initialize()?;
        assert_eq!(sim.phase(), Phase::Running);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.events_processed(), 0);
        assert_eq!(sim.arrivals(), 0);
        assert_eq!(sim.departures(), 0);
        assert_eq!(sim.stats().number_delayed(), 0);
        assert_eq!(sim.state().queue_length(), 0);
        assert!(!sim.state().is_busy());
        Ok(())
    }

    #[test]
    fn test_trace_sender() -> Result<()> {
        let (sender, receiver) = mpsc::channel();
        let draws = vec![uniform_for(1.0, 1.0), 0.5, uniform_for(0.5, 1.0), 0.5];
        let mut sim = Simulation::new(params(1.0), Replay::new(draws)).trace_sender(sender);
        sim.run()?;
        drop(sim);
        let lines: Vec<String> = receiver.iter().collect();
        assert_eq!(
            lines,
            vec![String::from(
                "1. Next Event: Customer 1 Arrival\n\n\
                 ----------No. of customer delayed 1----------\n\n"
            )]
        );
        Ok(())
    }

    #[test]
    fn test_disconnected_trace_is_dropped() -> Result<()> {
        let (sender, receiver) = mpsc::channel();
        drop(receiver);
        let mut sim = Simulation::new(params(10.0), RngSource::seeded(2)).trace_sender(sender);
        sim.run()?;
        assert!(sim.trace_sender.is_none());
        Ok(())
    }
}
