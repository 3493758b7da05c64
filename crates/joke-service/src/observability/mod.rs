//! Observability for the Jokes API.
//!
//! Provides metrics definitions and the Prometheus recorder.

pub mod metrics;
