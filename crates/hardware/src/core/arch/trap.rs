//! Trap Cause Encoding.
//!
//! Maps the high-level [`Trap`] variants onto the numeric cause codes and trap
//! values written to `mcause` and `mtval` on trap entry.

use crate::common::error::Trap;

/// Exception cause codes (`mcause` with the interrupt bit clear).
pub mod exception {
    /// Illegal instruction (2).
    pub const ILLEGAL_INSTRUCTION: u64 = 2;
    /// Environment call from U-mode (8).
    pub const ENVIRONMENT_CALL_FROM_U_MODE: u64 = 8;
    /// Environment call from S-mode (9).
    pub const ENVIRONMENT_CALL_FROM_S_MODE: u64 = 9;
    /// Environment call from M-mode (11).
    pub const ENVIRONMENT_CALL_FROM_M_MODE: u64 = 11;
}

impl Trap {
    /// Returns the exception code written to `mcause`.
    pub const fn cause(&self) -> u64 {
        match self {
            Self::IllegalInstruction(_) => exception::ILLEGAL_INSTRUCTION,
            Self::EnvironmentCallFromUMode => exception::ENVIRONMENT_CALL_FROM_U_MODE,
            Self::EnvironmentCallFromSMode => exception::ENVIRONMENT_CALL_FROM_S_MODE,
            Self::EnvironmentCallFromMMode => exception::ENVIRONMENT_CALL_FROM_M_MODE,
        }
    }

    /// Returns the value written to `mtval`.
    pub const fn tval(&self) -> u64 {
        match self {
            Self::IllegalInstruction(inst) => *inst as u64,
            _ => 0,
        }
    }

    /// Whether the trap is an environment call (the cooperative yield).
    pub const fn is_ecall(&self) -> bool {
        matches!(
            self,
            Self::EnvironmentCallFromUMode
                | Self::EnvironmentCallFromSMode
                | Self::EnvironmentCallFromMMode
        )
    }
}
