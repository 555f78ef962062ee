//! RISC-V Privilege Modes.
//!
//! This module defines the privilege levels supported by the RISC-V architecture.
//! It implements the following:
//! 1. **Mode Classification:** Definitions for User (U), Supervisor (S), and Machine (M) modes.
//! 2. **Serialization:** Conversion between numeric representations and enum variants.
//! 3. **Observability:** Human-readable naming and display formatting for privilege states.

use serde::Serialize;

/// RISC-V privilege mode levels.
///
/// Machine mode is the highest privilege level and the only one allowed to
/// stage and commit register windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PrivilegeMode {
    /// User mode (U-mode).
    User = 0,

    /// Supervisor mode (S-mode).
    Supervisor = 1,

    /// Machine mode (M-mode).
    Machine = 3,
}

impl PrivilegeMode {
    /// Converts a `u8` value to a privilege mode.
    ///
    /// # Returns
    ///
    /// The corresponding `PrivilegeMode`, defaulting to `Machine` for the reserved encoding 2.
    pub const fn from_u8(val: u8) -> Self {
        match val {
            0 => Self::User,
            1 => Self::Supervisor,
            _ => Self::Machine,
        }
    }

    /// Converts a privilege mode to its `u8` representation.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns the human-readable name of the privilege mode.
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Supervisor => "Supervisor",
            Self::Machine => "Machine",
        }
    }
}

impl std::fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
