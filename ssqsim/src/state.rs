use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default capacity of the waiting line.
pub const Q_LIMIT: usize = 100;

/// Abstraction over [`VecDeque`] that limits the capacity of the queue.
/// This means that push operations can fail.
///
/// [`VecDeque`]: https://doc.rust-lang.org/std/collections/struct.VecDeque.html
///
/// # Examples
///
/// ```
/// # use ssqsim::WaitingLine;
/// let mut line: WaitingLine<i32> = WaitingLine::bounded(2);
/// assert!(line.push_back(1).is_ok());
/// assert!(line.push_back(2).is_ok());
/// assert_eq!(line.push_back(3), Err(3));
/// assert_eq!(line.pop_front(), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WaitingLine<T> {
    inner: VecDeque<T>,
    capacity: usize,
}

impl<T> Default for WaitingLine<T> {
    fn default() -> Self {
        Self::bounded(Q_LIMIT)
    }
}

impl<T> WaitingLine<T> {
    /// Creates a line with the given capacity.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        Self {
            inner: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an element to the back of the line.
    /// If the line is full, the element is handed back.
    ///
    /// # Errors
    ///
    /// Returns the rejected value when the line is already at capacity.
    pub fn push_back(&mut self, value: T) -> std::result::Result<(), T> {
        if self.inner.len() < self.capacity {
            self.inner.push_back(value);
            Ok(())
        } else {
            Err(value)
        }
    }

    /// Removes the first element and returns it, or `None` if the line is empty.
    pub fn pop_front(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    /// Peeks at the element at the head of the line.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.inner.front()
    }

    /// Returns the number of elements in the line.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Checks if the line is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Checks if another push would be rejected.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.inner.len() >= self.capacity
    }

    /// Maximum number of elements the line can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates from the head to the tail of the line.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.inner.iter()
    }
}

/// Whether the server is currently serving a customer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    /// Nobody is in service.
    Idle,
    /// A customer is in service.
    Busy,
}

impl Default for ServerStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl ServerStatus {
    /// Value of the server-busy indicator function: 1 when busy, 0 when idle.
    #[must_use]
    pub fn indicator(self) -> f64 {
        match self {
            Self::Idle => 0.0,
            Self::Busy => 1.0,
        }
    }
}

/// Server status together with the arrival times of the customers waiting in line,
/// oldest first.
///
/// The number in queue is the length of the line, so the two can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemState {
    server: ServerStatus,
    waiting: WaitingLine<f64>,
}

impl Default for SystemState {
    fn default() -> Self {
        Self::new(Q_LIMIT)
    }
}

impl SystemState {
    /// Idle server and an empty line holding at most `queue_limit` customers.
    #[must_use]
    pub fn new(queue_limit: usize) -> Self {
        Self {
            server: ServerStatus::Idle,
            waiting: WaitingLine::bounded(queue_limit),
        }
    }

    /// Current server status.
    #[must_use]
    pub fn server_status(&self) -> ServerStatus {
        self.server
    }

    /// Checks if the server is busy.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.server == ServerStatus::Busy
    }

    /// Number of customers in the waiting line, excluding the one in service.
    #[must_use]
    pub fn queue_length(&self) -> usize {
        self.waiting.len()
    }

    /// Capacity of the waiting line.
    #[must_use]
    pub fn queue_limit(&self) -> usize {
        self.waiting.capacity()
    }

    /// Arrival times of the waiting customers, head first.
    pub fn waiting_arrivals(&self) -> impl Iterator<Item = f64> + '_ {
        self.waiting.iter().copied()
    }

    pub(crate) fn seize(&mut self) {
        self.server = ServerStatus::Busy;
    }

    pub(crate) fn release(&mut self) {
        self.server = ServerStatus::Idle;
    }

    /// Puts a customer who arrived at `time` at the tail of the line.
    pub(crate) fn enqueue(&mut self, time: f64) -> Result<()> {
        self.waiting
            .push_back(time)
            .map_err(|time| Error::QueueOverflow {
                time,
                capacity: self.waiting.capacity(),
            })
    }

    /// Takes the customer at the head of the line, returning their arrival time.
    pub(crate) fn dequeue(&mut self) -> Option<f64> {
        self.waiting.pop_front()
    }
}
