//! Control and Status Register (CSR) definitions and operations.
//!
//! This module implements the CSR subsystem for the windowed hart. It provides:
//! 1. **Address Definitions:** Constants for the machine-mode CSRs, the retired-instruction
//!    counters, and the two custom window CSRs.
//! 2. **Field Masks:** Bitmasks and shifts for `mstatus`.
//! 3. **Register Storage:** The `Csrs` struct for maintaining architectural state.
//! 4. **Access Logic:** Raw read and write operations without privilege checks.

/// Machine status register CSR address.
pub const MSTATUS: u32 = 0x300;

/// Machine trap vector base address register CSR address.
pub const MTVEC: u32 = 0x305;

/// Machine scratch register CSR address.
pub const MSCRATCH: u32 = 0x340;

/// Machine exception program counter CSR address.
pub const MEPC: u32 = 0x341;

/// Machine cause register CSR address.
pub const MCAUSE: u32 = 0x342;

/// Machine trap value register CSR address.
pub const MTVAL: u32 = 0x343;

/// Active window configuration (custom, read-only mirror of the last commit).
pub const WINDOW_ACTIVE: u32 = 0x800;

/// Staged window configuration (custom, committed by the next `mret`).
pub const WINDOW_STAGED: u32 = 0x801;

/// Machine cycle counter CSR address.
pub const MCYCLE: u32 = 0xB00;

/// Machine instructions retired counter CSR address.
pub const MINSTRET: u32 = 0xB02;

/// Cycle counter CSR address (read-only, user mode accessible).
pub const CYCLE: u32 = 0xC00;

/// Instructions retired counter CSR address (read-only, user mode accessible).
pub const INSTRET: u32 = 0xC02;

/// Machine interrupt enable bit in `mstatus` register.
pub const MSTATUS_MIE: u64 = 1 << 3;

/// Machine previous interrupt enable bit in `mstatus` register.
pub const MSTATUS_MPIE: u64 = 1 << 7;

/// Machine previous privilege mode field mask in `mstatus` register.
pub const MSTATUS_MPP: u64 = 3 << 11;

/// Bit shift for machine previous privilege mode field in `mstatus` register.
pub const MSTATUS_MPP_SHIFT: u64 = 11;

/// Bit mask for machine previous privilege mode field in `mstatus` register.
pub const MSTATUS_MPP_MASK: u64 = 3;

/// Modify privilege bit in `mstatus` register.
pub const MSTATUS_MPRV: u64 = 1 << 17;

/// Machine double-trap bit in `mstatus` register.
pub const MSTATUS_MDT: u64 = 1 << 42;

/// Extracts the privilege level encoded in the CSR address (bits 9:8).
pub const fn required_privilege(addr: u32) -> u8 {
    ((addr >> 8) & 0x3) as u8
}

/// Whether the CSR address is in a read-only range (bits 11:10 == 0b11).
pub const fn is_read_only(addr: u32) -> bool {
    (addr >> 10) & 0x3 == 0x3
}

/// Control and Status Register file.
///
/// Holds the machine-level CSRs the trap and return paths touch, plus the
/// CSR-visible mirror of the active window. The staged window lives in the
/// register file itself because the commit consumes it from there.
#[derive(Clone, Debug)]
pub struct Csrs {
    /// Machine status register.
    pub mstatus: u64,
    /// Machine trap vector base address.
    pub mtvec: u64,
    /// Machine scratch register; holds the current task control block address.
    pub mscratch: u64,
    /// Machine exception program counter.
    pub mepc: u64,
    /// Machine trap cause.
    pub mcause: u64,
    /// Machine trap value.
    pub mtval: u64,
    /// Mirror of the last committed window configuration.
    pub window_active: u64,
}

impl Default for Csrs {
    fn default() -> Self {
        Self {
            mstatus: 0,
            mtvec: 0,
            mscratch: 0,
            mepc: 0,
            mcause: 0,
            mtval: 0,
            window_active: crate::common::constants::RESET_WINDOW as u64,
        }
    }
}

impl Csrs {
    /// Reads a CSR value by its address.
    ///
    /// # Returns
    ///
    /// The 64-bit value stored in the specified CSR, or 0 if the address is not
    /// backed by this struct.
    pub fn read(&self, addr: u32) -> u64 {
        match addr {
            MSTATUS => self.mstatus,
            MTVEC => self.mtvec,
            MSCRATCH => self.mscratch,
            MEPC => self.mepc,
            MCAUSE => self.mcause,
            MTVAL => self.mtval,
            WINDOW_ACTIVE => self.window_active,
            _ => 0,
        }
    }

    /// Writes a value to a CSR by its address.
    pub fn write(&mut self, addr: u32, val: u64) {
        match addr {
            MSTATUS => self.mstatus = val,
            MTVEC => self.mtvec = val,
            MSCRATCH => self.mscratch = val,
            MEPC => self.mepc = val & !1,
            MCAUSE => self.mcause = val,
            MTVAL => self.mtval = val,
            WINDOW_ACTIVE => self.window_active = val,
            _ => {}
        }
    }
}
