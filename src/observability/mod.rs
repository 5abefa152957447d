//! Tracing initialization with configurable logging formats.

pub mod tracing_init;

pub use tracing_init::{TracingError, init_tracing};
