//! Core processor implementation.
//!
//! This module contains the windowed hart: architecture-specific components and
//! the CPU that owns them.

/// Architecture-specific components (CSRs, windowed register file, privilege modes, traps).
pub mod arch;

/// CPU state, CSR access, modeled execution, and trap handling.
pub mod cpu;

pub use self::cpu::Cpu;
