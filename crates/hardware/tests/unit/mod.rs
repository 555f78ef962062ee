//! # Unit Components
//!
//! This module organizes the tests of each part of the windowed hart, from the
//! packed window encoding up to the benchmark scenarios.





/// Unit tests for configuration defaults and JSON parsing.
pub mod config;
