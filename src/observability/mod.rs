//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID is attached to every dispatcher log line
//! - Metric updates are cheap enough to sit inside the table lock

use thiserror::Error;

pub mod logging;
pub mod metrics;

/// Failure to bring up logging or metrics at startup.
#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("failed to initialize metrics exporter: {0}")]
    Metrics(String),
}
