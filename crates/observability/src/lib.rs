//! Process-wide `tracing` setup for permit hosts and tests.

pub mod tracing;

pub use crate::tracing::{DEFAULT_DIRECTIVE, init, init_for_tests, init_with};
