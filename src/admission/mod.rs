//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher hands over a client id
//!     → controller.rs (lock table, expire, increment, store)
//!     → post-increment count
//!     → Decision::for_count (count > quota → Reject)
//!
//! Background:
//!     sweeper.rs ticks → controller.sweep_expired()
//! ```
//!
//! # Design Decisions
//! - One mutex over the whole table; check-expire-increment-store is a single
//!   critical section
//! - A window that has lasted exactly its length is expired
//! - The controller is an owned value, never global state

pub mod controller;
pub mod session;
pub mod sweeper;

pub use controller::{AdmissionController, AdmissionPolicy, Decision};
pub use session::{ClientId, Session, SessionTable};
pub use sweeper::SessionSweeper;
