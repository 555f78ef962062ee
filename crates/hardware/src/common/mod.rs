//! Common utilities and types used throughout the windowed-register simulator.
//!
//! This module provides fundamental building blocks that are shared across all components
//! of the simulator. It includes:
//! 1. **Constants:** Register indices, packed window layout, and task control block layout.
//! 2. **Error Handling:** Architectural traps and configuration errors.

/// Common constants used throughout the simulator.
pub mod constants;

/// Error types and trap definitions.
pub mod error;

pub use error::{ConfigError, Trap};
