//! Finto - in-memory stand-in for the work-journal report backend.
//!
//! Serves the `/v1/reports` routes with the same envelope, validation and
//! error codes as the real service, and simulates the generation worker
//! with configurable delays and outcome.

pub mod html;
pub mod server;

pub use server::{router, serve, AppState, Behaviour, ServiceError};
