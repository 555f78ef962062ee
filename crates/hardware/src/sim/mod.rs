//! Simulation driver.
//!
//! Couples a windowed hart with its scheduler: the yield-trap glue, the bootstrap
//! stub for never-run tasks, and a runner for cooperative task bodies.

/// Simulator and task-body interface.
pub mod simulator;

pub use simulator::{BOOTSTRAP_INSTRUCTIONS, RunError, RunOutcome, Simulator, Step, TaskBody};
