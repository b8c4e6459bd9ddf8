//! Metrics for pagekeep.
//!
//! Crates record through the `metrics` facade macros re-exported here, using
//! the names in [`definitions`]. Nothing is exported unless a recorder is
//! installed with [`init_metrics`]; with the `prometheus` feature that
//! recorder serves the Prometheus text format over HTTP.
//!
//! ```rust,ignore
//! use pagekeep_metrics::{counter, correlation};
//!
//! counter!(correlation::MATCHES_TOTAL).increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
