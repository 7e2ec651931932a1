use std::fmt;
use std::io;
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

use serde::Serialize;

use crate::{CustomerId, EventKind};

/// Record of a single processed event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraceRecord {
    /// Sequential number of the event, starting at 1.
    pub index: usize,
    /// What happened.
    pub kind: EventKind,
    /// Arrival number for arrivals, departure number for departures.
    pub customer: CustomerId,
    /// Simulation time of the event.
    pub time: f64,
    /// Number of customers who have begun service, including this event.
    pub delayed: u64,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. Next Event: Customer {} {}",
            self.index, self.customer, self.kind
        )
    }
}

impl TraceRecord {
    /// Text written to the event trace: the record line, followed by the running count of
    /// delayed customers after an arrival.
    #[must_use]
    pub fn entry(&self) -> String {
        match self.kind {
            EventKind::Arrival => format!(
                "{}\n\n----------No. of customer delayed {}----------\n\n",
                self, self.delayed
            ),
            EventKind::Departure => format!("{}\n", self),
        }
    }
}

/// Writes every message received on `receiver` to `writer` on a separate thread, until all the
/// senders are dropped.
///
/// Join the returned handle to make sure everything has been flushed.
pub fn write_from_channel<W, T>(mut writer: W, receiver: Receiver<T>) -> JoinHandle<io::Result<()>>
where
    W: io::Write + Send + 'static,
    T: AsRef<[u8]> + Send + 'static,
{
    std::thread::spawn(move || {
        while let Ok(msg) = receiver.recv() {
            writer.write_all(msg.as_ref())?;
        }
        writer.flush()
    })
}
