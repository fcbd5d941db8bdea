//! Per-client admission control endpoint library.

pub mod admission;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod simulator;

pub use admission::{AdmissionController, AdmissionPolicy, Decision};
pub use config::GateConfig;
pub use http::GateServer;
pub use lifecycle::Shutdown;
