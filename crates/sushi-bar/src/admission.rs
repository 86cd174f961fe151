//! Capacity-bounded admission with FIFO hand-off.
//!
//! All state transitions happen under a single `parking_lot::Mutex`. A caller that finds the
//! bar full parks a oneshot sender at the back of the wait queue and awaits the receiver with
//! the lock released. `leave` hands the freed seat straight to the head of the queue: the
//! waiter's ticket is minted and the waiter is seated before the lock is dropped, so a racing
//! `enter` can never slip into that seat.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::errors::AdmissionError;

/// Handle correlating an admission with its later departure. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Ticket {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A seated client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occupant {
    pub name: String,
    pub ticket: Ticket,
}

impl Occupant {
    pub fn farewell(&self) -> String {
        format!("Thank you {}! Hope to see you again", self.name)
    }
}

/// Result of a successful `enter`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admission {
    pub ticket: Ticket,
    /// Time between the call and being seated.
    pub waited: Duration,
}

/// Result of a successful `leave`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Departure {
    pub occupant: Occupant,
    /// Ticket minted for the waiter that inherited the seat, if anyone was queued.
    pub promoted: Option<Ticket>,
}

/// Consistent point-in-time view of the bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub capacity: usize,
    /// Sorted by ticket.
    pub occupants: Vec<Occupant>,
    pub waiting: usize,
    pub last_ticket: Option<Ticket>,
}

#[derive(Debug)]
struct Waiter {
    id: u64,
    name: String,
    responder: oneshot::Sender<Ticket>,
}

#[derive(Debug, Default)]
struct State {
    occupants: HashMap<Ticket, Occupant>,
    last_ticket: u64,
    waiters: VecDeque<Waiter>,
    next_waiter_id: u64,
}

impl State {
    fn seat(&mut self, name: String) -> Ticket {
        self.last_ticket += 1;
        let ticket = Ticket(self.last_ticket);
        self.occupants.insert(ticket, Occupant { name, ticket });
        ticket
    }

    /// Seat the longest-waiting caller that is still listening.
    fn hand_off(&mut self) -> Option<Ticket> {
        while let Some(Waiter { id, name, responder }) = self.waiters.pop_front() {
            if responder.is_closed() {
                debug!(waiter = id, "skipping waiter {} that stopped listening", name);
                continue;
            }

            let ticket = self.seat(name);
            match responder.send(ticket) {
                Ok(()) => return Some(ticket),
                Err(ticket) => {
                    if let Some(occupant) = self.occupants.remove(&ticket) {
                        warn!(waiter = id, %ticket, "hand-off to {} dropped, trying next waiter", occupant.name);
                    }
                }
            }
        }
        None
    }

    fn release(&mut self, ticket: Ticket) -> Result<Departure, AdmissionError> {
        let occupant = self
            .occupants
            .remove(&ticket)
            .ok_or(AdmissionError::NotFound(ticket))?;
        let promoted = self.hand_off();
        Ok(Departure { occupant, promoted })
    }
}

enum Entry<'a> {
    Seated(Ticket),
    Queued(QueuedEntry<'a>),
}

/// A caller parked in the wait queue. Dropping it before it is seated withdraws the caller.
struct QueuedEntry<'a> {
    controller: &'a AdmissionController,
    id: u64,
    rx: oneshot::Receiver<Ticket>,
    settled: bool,
}

impl Drop for QueuedEntry<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.controller.withdraw(self.id, &mut self.rx);
        }
    }
}

/// Seats at most `capacity` occupants and queues everyone else in arrival order.
#[derive(Debug)]
pub struct AdmissionController {
    capacity: NonZeroUsize,
    state: Mutex<State>,
}

impl AdmissionController {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn occupancy(&self) -> usize {
        self.state.lock().occupants.len()
    }

    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    pub fn last_ticket(&self) -> Option<Ticket> {
        match self.state.lock().last_ticket {
            0 => None,
            n => Some(Ticket(n)),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        let mut occupants: Vec<Occupant> = state.occupants.values().cloned().collect();
        occupants.sort_by_key(|o| o.ticket);
        Snapshot {
            capacity: self.capacity.get(),
            occupants,
            waiting: state.waiters.len(),
            last_ticket: (state.last_ticket > 0).then_some(Ticket(state.last_ticket)),
        }
    }

    /// Take a seat, waiting in line for as long as it takes.
    ///
    /// Dropping the returned future while queued gives up the place in line; if a seat was
    /// already handed over in the meantime it is passed on to the next waiter.
    pub async fn enter(&self, name: impl Into<String>) -> Admission {
        let name = name.into();
        let requested_at = Instant::now();
        debug!("client {} is waiting to enter the sushi bar", name);

        loop {
            let mut queued = match self.seat_or_enqueue(&name) {
                Entry::Seated(ticket) => return self.admitted(&name, ticket, requested_at),
                Entry::Queued(queued) => queued,
            };

            let handed_over = (&mut queued.rx).await;
            queued.settled = true;
            match handed_over {
                Ok(ticket) => return self.admitted(&name, ticket, requested_at),
                // sender went away without a seat; line up again
                Err(_) => continue,
            }
        }
    }

    /// Like [`enter`](Self::enter), but gives up after `timeout` and leaves the queue.
    pub async fn enter_within(
        &self,
        name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Admission, AdmissionError> {
        let name = name.into();
        let started = Instant::now();
        match tokio::time::timeout(timeout, self.enter(name.clone())).await {
            Ok(admission) => Ok(admission),
            Err(_elapsed) => {
                info!("client {} timed out waiting for a seat", name);
                Err(AdmissionError::TimedOut {
                    name,
                    waited: started.elapsed(),
                })
            }
        }
    }

    /// Free the seat held by `ticket`, handing it to the next waiter if there is one.
    pub fn leave(&self, ticket: Ticket) -> Result<Departure, AdmissionError> {
        let departure = self.state.lock().release(ticket);
        match &departure {
            Ok(departure) => {
                info!(%ticket, "client {} left the sushi bar", departure.occupant.name);
                if let Some(next) = departure.promoted {
                    info!(ticket = %next, "seat handed to the next waiter");
                }
            }
            Err(_) => warn!(%ticket, "leave rejected, no occupant holds this ticket"),
        }
        departure
    }

    // parking_lot guards are !Send, so the lock cannot be held across the await in `enter`.
    fn seat_or_enqueue(&self, name: &str) -> Entry<'_> {
        let mut state = self.state.lock();
        if state.waiters.is_empty() && state.occupants.len() < self.capacity.get() {
            return Entry::Seated(state.seat(name.to_owned()));
        }

        let (responder, rx) = oneshot::channel();
        let id = state.next_waiter_id;
        state.next_waiter_id += 1;
        state.waiters.push_back(Waiter {
            id,
            name: name.to_owned(),
            responder,
        });
        debug!(waiter = id, position = state.waiters.len(), "sushi bar full, {} queued", name);

        Entry::Queued(QueuedEntry {
            controller: self,
            id,
            rx,
            settled: false,
        })
    }

    fn withdraw(&self, id: u64, rx: &mut oneshot::Receiver<Ticket>) {
        let mut state = self.state.lock();
        if let Some(pos) = state.waiters.iter().position(|w| w.id == id) {
            if let Some(waiter) = state.waiters.remove(pos) {
                debug!(waiter = id, "client {} withdrew from the queue", waiter.name);
            }
            return;
        }

        // A leave seated this caller before it noticed; pass the seat on.
        if let Ok(ticket) = rx.try_recv() {
            if let Ok(departure) = state.release(ticket) {
                debug!(
                    waiter = id,
                    %ticket,
                    "client {} withdrew after being seated, seat released",
                    departure.occupant.name
                );
            }
        }
    }

    fn admitted(&self, name: &str, ticket: Ticket, requested_at: Instant) -> Admission {
        let waited = requested_at.elapsed();
        info!(
            %ticket,
            "client {} waited {}ms to enter the sushi bar, and got ticket {}",
            name,
            waited.as_millis(),
            ticket
        );
        Admission { ticket, waited }
    }
}
