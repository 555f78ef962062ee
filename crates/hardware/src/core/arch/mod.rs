//! RISC-V architecture-specific components.
//!
//! This module contains the implementation of core RISC-V architectural elements.
//! It includes the following modules:
//! 1. **CSRs:** Control and Status Register definitions and access logic.
//! 2. **GPRs:** The windowed general-purpose register file.
//! 3. **Modes:** Privilege mode definitions and transitions.
//! 4. **Traps:** Cause-code encoding for trap entry.
//! 5. **Windows:** The packed window configuration value.

/// Control and Status Register (CSR) definitions and access logic.
pub mod csr;

/// Windowed general-purpose register file.
pub mod gpr;

/// Privilege mode definitions and transitions.
pub mod mode;

/// Trap cause encoding.
pub mod trap;

/// Packed register-window configuration.
pub mod window;

pub use window::WindowConfig;
