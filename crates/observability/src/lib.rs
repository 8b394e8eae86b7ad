//! Tracing setup shared by the API server and the seed CLI.

pub mod tracing;

pub use crate::tracing::{init, init_for_cli, DEFAULT_FILTER};
