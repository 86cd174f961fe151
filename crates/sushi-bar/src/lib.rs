//! A sushi bar with a fixed number of seats.
//!
//! [`admission::AdmissionController`] is the whole synchronization story: it seats at most
//! `capacity` clients, queues the rest in arrival order and hands each freed seat directly to
//! the longest waiter. [`service`] puts it behind the `sushibar.SushiBar` gRPC service.

pub mod admission;
pub mod config;
pub mod errors;
pub mod service;

pub use admission::{Admission, AdmissionController, Departure, Occupant, Snapshot, Ticket};
pub use errors::AdmissionError;
pub use service::{SushiBarService, serve};
