//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod http;
pub mod notify;
pub mod telemetry;
