//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod ghost;
pub mod http;
pub mod telemetry;
