//! Event handlers. They change the state, schedule follow-up events, and record delays,
//! but never touch the time integrals: those are brought up to date before dispatch.

use crate::{exponential, EventKind, Result, Simulation, UniformSource};

impl<S: UniformSource> Simulation<S> {
    /// A customer arrives: they either start service right away with no delay or join the tail
    /// of the waiting line. Either way, the next arrival is scheduled first.
    pub(crate) fn arrive(&mut self) -> Result<()> {
        let now = self.calendar.time();
        self.arrivals += 1;
        let interarrival = exponential(&mut self.source, self.params.mean_interarrival())?;
        self.calendar.schedule_at(EventKind::Arrival, now + interarrival);

        if self.state.is_busy() {
            self.state.enqueue(now)?;
            log::trace!(
                "[{:.3}] Customer {} waits, {} in queue",
                now,
                self.arrivals,
                self.state.queue_length()
            );
        } else {
            self.stats.record_delay(0.0);
            self.state.seize();
            let service = exponential(&mut self.source, self.params.mean_service())?;
            self.calendar.schedule_at(EventKind::Departure, now + service);
            log::trace!("[{:.3}] Customer {} goes straight to service", now, self.arrivals);
        }
        Ok(())
    }

    /// The customer in service leaves. The head of the line, if any, begins service.
    pub(crate) fn depart(&mut self) -> Result<()> {
        let now = self.calendar.time();
        self.departures += 1;

        if let Some(arrival) = self.state.dequeue() {
            let delay = now - arrival;
            self.stats.record_delay(delay);
            let service = exponential(&mut self.source, self.params.mean_service())?;
            self.calendar.schedule_at(EventKind::Departure, now + service);
            log::trace!(
                "[{:.3}] Next customer waited {:.3}, {} left in queue",
                now,
                delay,
                self.state.queue_length()
            );
        } else {
            self.state.release();
            self.calendar.cancel(EventKind::Departure);
            log::trace!("[{:.3}] Queue is empty, server goes idle", now);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{
        Error, EventKind, Replay, RunParameters, ServerStatus, Simulation, UniformSource, IDLE_TIME,
    };
    use float_cmp::approx_eq;
    use testing::uniform_for;

    fn running(queue_limit: usize, durations: &[f64]) -> Simulation<Replay> {
        let params = RunParameters::new(1.0, 1.0, 100.0)
            .and_then(|p| p.with_queue_limit(queue_limit))
            .unwrap();
        let draws = durations.iter().map(|&d| uniform_for(d, 1.0));
        let mut sim = Simulation::new(params, Replay::new(draws));
        sim.initialize().unwrap();
        sim
    }

    fn advance<S: UniformSource>(sim: &mut Simulation<S>) -> EventKind {
        let (kind, time) = sim.calendar.select_next().unwrap();
        sim.stats.advance(time, &sim.state);
        kind
    }

    #[test]
    fn test_arrival_to_idle_server() {
        let mut sim = running(5, &[1.0, 2.0, 3.0]);
        assert_eq!(advance(&mut sim), EventKind::Arrival);
        sim.arrive().unwrap();
        assert_eq!(sim.state.server_status(), ServerStatus::Busy);
        assert_eq!(sim.state.queue_length(), 0);
        assert_eq!(sim.stats.number_delayed(), 1);
        assert_eq!(sim.stats.total_delay(), 0.0);
        assert!(approx_eq!(f64, sim.calendar.next_time(EventKind::Arrival), 3.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, sim.calendar.next_time(EventKind::Departure), 4.0, epsilon = 1e-9));
    }

    #[test]
    fn test_arrival_to_busy_server_waits() {
        let mut sim = running(5, &[1.0, 0.5, 10.0, 0.25]);
        advance(&mut sim);
        sim.arrive().unwrap();
        advance(&mut sim);
        sim.arrive().unwrap();
        assert_eq!(sim.stats.number_delayed(), 1);
        assert_eq!(sim.state.queue_length(), 1);
        assert!(approx_eq!(
            f64,
            sim.state.waiting_arrivals().next().unwrap(),
            1.5,
            epsilon = 1e-9
        ));
        assert_eq!(sim.arrivals, 2);
    }

    #[test]
    fn test_overflow() {
        let mut sim = running(1, &[1.0, 1.0, 50.0, 1.0, 1.0]);
        for _ in 0..2 {
            advance(&mut sim);
            sim.arrive().unwrap();
        }
        assert_eq!(sim.state.queue_length(), 1);
        advance(&mut sim);
        match sim.arrive() {
            Err(Error::QueueOverflow { time, capacity }) => {
                assert!(approx_eq!(f64, time, 3.0, epsilon = 1e-9));
                assert_eq!(capacity, 1);
            }
            other => panic!("expected overflow, got {:?}", other),
        }
        assert_eq!(sim.state.queue_length(), 1);
    }

    #[test]
    fn test_departure_with_queue() {
        // Arrivals at 1, 1.5, and 2; first service ends at 4.
        let mut sim = running(5, &[1.0, 0.5, 3.0, 0.5, 10.0, 2.0]);
        for _ in 0..3 {
            assert_eq!(advance(&mut sim), EventKind::Arrival);
            sim.arrive().unwrap();
        }
        assert_eq!(advance(&mut sim), EventKind::Departure);
        sim.depart().unwrap();
        assert_eq!(sim.state.queue_length(), 1);
        assert_eq!(sim.stats.number_delayed(), 2);
        assert!(approx_eq!(f64, sim.stats.total_delay(), 2.5, epsilon = 1e-9));
        assert!(approx_eq!(f64, sim.calendar.next_time(EventKind::Departure), 6.0, epsilon = 1e-9));
        // The remaining customer keeps their own arrival time.
        assert!(approx_eq!(
            f64,
            sim.state.waiting_arrivals().next().unwrap(),
            2.0,
            epsilon = 1e-9
        ));
        assert_eq!(sim.departures, 1);
    }

    #[test]
    fn test_departure_empties_server() {
        let mut sim = running(5, &[1.0, 5.0, 1.0]);
        advance(&mut sim);
        sim.arrive().unwrap();
        assert_eq!(advance(&mut sim), EventKind::Departure);
        sim.depart().unwrap();
        assert_eq!(sim.state.server_status(), ServerStatus::Idle);
        assert_eq!(sim.calendar.next_time(EventKind::Departure), IDLE_TIME);
        assert_eq!(sim.stats.number_delayed(), 1);
    }
}
