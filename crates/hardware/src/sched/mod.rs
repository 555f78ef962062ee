//! Cooperative task scheduling on top of the windowed register bank.
//!
//! This module provides:
//! 1. **Task Control Blocks:** A fixed-size, id-indexed table of per-task saved state.
//! 2. **Policies:** Fixed-pair alternation and an N-task rotating queue.
//! 3. **Scheduler Context:** The single owner of the task table and current-task pointer;
//!    its `schedule` runs inside the yield trap and stages the next task's window.

/// Scheduler state and the `schedule` entry point.
pub mod context;

/// Next-task selection.
pub mod policy;

/// Task control blocks and the fixed-size task table.
pub mod tcb;

pub use context::SchedulerContext;
pub use tcb::{Launch, StackRegion, TaskControlBlock, TaskId, TaskRegistry};
