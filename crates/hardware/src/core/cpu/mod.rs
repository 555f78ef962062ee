//! CPU Core Definition and Initialization.
//!
//! This module defines the `Cpu` structure, the architectural state of one windowed hart.
//! It coordinates the following:
//! 1. **State Management:** Maintains the windowed register file, program counter, and privilege mode.
//! 2. **CSR Access:** Privilege-checked reads and writes, including the two window CSRs.
//! 3. **Traps:** Trap entry and the `mret` return path, the only place a staged window commits.
//! 4. **Execution:** The handful of modeled instructions, each retiring exactly once.

/// Control and Status Register access and management.
pub mod csr;

/// Modeled instruction execution and retirement accounting.
pub mod execution;

/// Trap entry and trap return.
pub mod trap;

use crate::config::Config;
use crate::core::arch::csr::{Csrs, MSTATUS_MPP_SHIFT};
use crate::core::arch::gpr::Gpr;
use crate::core::arch::mode::PrivilegeMode;
use crate::stats::SimStats;

/// Architectural state of a single windowed hart.
#[derive(Debug)]
pub struct Cpu {
    /// Windowed general-purpose registers.
    pub regs: Gpr,
    /// Program Counter.
    pub pc: u64,
    /// Control and Status Registers.
    pub csrs: Csrs,
    /// Current Privilege Mode (M, S, U).
    pub privilege: PrivilegeMode,
    /// Whether U-mode is implemented; decides where `mret` drops privilege to.
    pub user_mode: bool,
    /// Enable instruction tracing.
    pub trace: bool,
    /// Performance statistics.
    pub stats: SimStats,
}

impl Cpu {
    /// Creates a hart in its reset state: Machine mode with `mstatus.MPP` = M,
    /// window 0 active and staged, PC at `general.start_pc`, `mtvec` at `general.trap_vector`.
    pub fn new(config: &Config) -> Self {
        let csrs = Csrs {
            mstatus: (PrivilegeMode::Machine.to_u8() as u64) << MSTATUS_MPP_SHIFT,
            mtvec: config.general.trap_vector,
            ..Csrs::default()
        };
        Self {
            regs: Gpr::new(config.window.physical_registers),
            pc: config.general.start_pc,
            csrs,
            privilege: PrivilegeMode::Machine,
            user_mode: config.general.user_mode,
            trace: config.general.trace_instructions,
            stats: SimStats::default(),
        }
    }
}
