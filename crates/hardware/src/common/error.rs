//! Trap and Configuration Error definitions.
//!
//! This module defines the error handling mechanisms for the simulator. It provides:
//! 1. **Trap Representation:** The synchronous exceptions a windowed hart can raise.
//! 2. **Configuration Errors:** Problems detected while building a scheduler from a `Config`.
//!
//! Modeling defects (an out-of-range window, an unregistered task id, a re-entrant
//! scheduler) are not represented here; they are fatal assertions at the boundary
//! because recovering from them would hide a corrupted register context.

use std::fmt;

/// RISC-V trap types raised by the windowed hart model.
///
/// Only the synchronous exceptions reachable from the modeled instructions
/// (`csrr`, `csrw`, `ecall`, `mret`) are represented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trap {
    /// Illegal instruction exception.
    ///
    /// Raised for CSR accesses without sufficient privilege, writes to a read-only
    /// CSR, and `mret` outside Machine mode. The associated value is the CSR
    /// address, or the `mret` encoding (`0x3020_0073`) for an `mret`.
    IllegalInstruction(u32),

    /// Environment call from user mode.
    EnvironmentCallFromUMode,

    /// Environment call from supervisor mode.
    EnvironmentCallFromSMode,

    /// Environment call from machine mode.
    EnvironmentCallFromMMode,
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalInstruction(inst) => write!(f, "IllegalInstruction({inst:#x})"),
            Self::EnvironmentCallFromUMode => write!(f, "EnvironmentCallFromUMode"),
            Self::EnvironmentCallFromSMode => write!(f, "EnvironmentCallFromSMode"),
            Self::EnvironmentCallFromMMode => write!(f, "EnvironmentCallFromMMode"),
        }
    }
}

impl std::error::Error for Trap {}

/// Errors detected while turning a [`Config`](crate::config::Config) into a running model.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A window does not fit in the physical register bank.
    #[error(
        "window {config:#010x} (base {base}, size {size}) exceeds the physical bank of {capacity} registers"
    )]
    WindowOutOfRange {
        /// Packed window configuration.
        config: u32,
        /// Window base index.
        base: usize,
        /// Window size.
        size: usize,
        /// Physical register capacity.
        capacity: usize,
    },

    /// The fixed-size task table has no free slot.
    #[error("task table is full ({capacity} slots)")]
    TaskTableFull {
        /// Number of slots in the table.
        capacity: usize,
    },

    /// The fixed-pair policy was configured with a task count other than two.
    #[error("fixed-pair scheduling needs exactly 2 tasks, {found} registered")]
    PairPolicyArity {
        /// Number of registered tasks.
        found: usize,
    },

    /// No tasks were registered before the scheduler was started.
    #[error("no tasks registered")]
    NoTasks,

    /// The physical register bank cannot hold the reset window.
    #[error("physical bank of {capacity} registers cannot hold the 32-register reset window")]
    BankTooSmall {
        /// Physical register capacity.
        capacity: usize,
    },

    /// Task stacks were configured with no slots.
    #[error("task stacks need at least one word")]
    EmptyStack,

    /// A memory region reaches past the 32-bit words of the TCB image.
    #[error("{region} ends at {end:#x}, beyond the 32-bit address space")]
    AddressOutOfRange {
        /// Region that does not fit.
        region: &'static str,
        /// First byte past the region, saturated on overflow.
        end: u64,
    },

    /// The stress scenario was asked for more round trips than it can count.
    #[error("{requested} stress iterations exceeds the limit of {limit}")]
    TooManyIterations {
        /// Requested round trips.
        requested: u64,
        /// Largest accepted value.
        limit: u64,
    },

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}
