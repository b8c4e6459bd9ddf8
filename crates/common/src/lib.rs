//! Small helpers shared across pagekeep crates.

pub mod time;
