//! Global System Constants.
//!
//! This module defines system-wide constants used across the simulator. It includes:
//! 1. **Register Constants:** Architectural register count and ABI register indices.
//! 2. **Window Constants:** Field layout of the packed window configuration and reset values.
//! 3. **Task Constants:** Memory layout of a task control block.
//! 4. **Instruction Constants:** Instruction and stack word sizes.

/// Number of architectural general-purpose registers (`x0`-`x31`).
pub const ARCH_REGS: usize = 32;

/// ABI index of the return address register (`ra`).
pub const REG_RA: usize = 1;

/// ABI index of the stack pointer register (`sp`).
pub const REG_SP: usize = 2;

/// ABI index of the global pointer register (`gp`).
pub const REG_GP: usize = 3;

/// ABI index of the thread pointer register (`tp`).
pub const REG_TP: usize = 4;

/// ABI index of temporary register `t0`.
pub const REG_T0: usize = 5;

/// ABI index of saved register `s1`.
pub const REG_S1: usize = 9;

/// ABI index of saved register `s2`.
pub const REG_S2: usize = 18;

/// ABI index of saved register `s3`.
pub const REG_S3: usize = 19;

/// Bit shift of the `size` field in a packed window configuration.
pub const WINDOW_SIZE_SHIFT: u32 = 16;

/// Mask of a single packed window configuration field (`base` or `size`).
pub const WINDOW_FIELD_MASK: u32 = 0xFFFF;

/// Window selected at machine reset: base 0, size 32.
pub const RESET_WINDOW: u32 = 0x0020_0000;

/// Size of one task control block in bytes (four 32-bit words).
pub const TCB_SIZE: u64 = 16;

/// Byte offset of the saved stack pointer within a task control block.
pub const TCB_SP_OFFSET: u64 = 0;

/// Byte offset of the saved program counter within a task control block.
pub const TCB_PC_OFFSET: u64 = 4;

/// Byte offset of the window configuration within a task control block.
pub const TCB_WINDOW_OFFSET: u64 = 8;

/// Byte offset of the task id within a task control block.
pub const TCB_ID_OFFSET: u64 = 12;

/// Exclusive upper bound of an address held in a 32-bit TCB image word.
pub const ADDRESS_LIMIT: u64 = 1 << 32;

/// Width of a stack slot in bytes.
pub const STACK_WORD: u64 = 4;

/// Size of a standard (32-bit) RISC-V instruction in bytes.
pub const INSTRUCTION_SIZE_32: u64 = 4;
