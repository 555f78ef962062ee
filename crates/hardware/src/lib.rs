//! Windowed-register RISC-V hart simulator library.
//!
//! This crate models a single RISC-V hart whose general-purpose registers are a
//! movable window into a larger physical bank, together with the cooperative
//! scheduler that switches tasks by switching windows. It provides the following:
//! 1. **Core:** The windowed register file, the two window CSRs, and the `mret` commit point.
//! 2. **Scheduler:** Task control blocks, selection policies, and the yield-trap glue.
//! 3. **Simulation:** Task bodies run cooperatively on the hart, with configuration and statistics.
//! 4. **Benchmarks:** Retired-instruction measurement and the isolation, cost, and scaling scenarios.

/// Retired-instruction measurement and benchmark scenarios.
pub mod bench;
/// Common types and constants (register indices, TCB layout, traps, errors).
pub mod common;
/// Simulator configuration (defaults, policy enum, hierarchical config structures).
pub mod config;
/// Hart state (arch components, CSR access, execution, trap handling).
pub mod core;
/// Cooperative scheduler (TCBs, policies, scheduling decision).
pub mod sched;
/// Simulator driving task bodies through the yield trap.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The hart; holds the windowed registers, CSRs, and stats.
pub use crate::core::Cpu;
/// Packed `(size << 16) | base` window selection.
pub use crate::core::arch::WindowConfig;
/// Task table plus current-task pointer; one per hart.
pub use crate::sched::SchedulerContext;
/// Hart plus scheduler; construct with `Simulator::new`.
pub use crate::sim::Simulator;
