//! HTTP protocol handling subsystem (the request dispatcher).
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, client id extraction)
//!     → admission controller (count)
//!     → response.rs (200 / 503, empty body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{extract_client_id, IdentifierError, MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, GateServer};
