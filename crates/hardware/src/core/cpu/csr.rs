//! CSR Access Logic.
//!
//! This module implements the Control and Status Register (CSR) access mechanisms for the CPU.
//! It performs the following:
//! 1. **Privilege Checks:** Rejects accesses from insufficient privilege with an illegal-instruction trap.
//! 2. **Window CSRs:** Writing `0x801` stages a window; `0x800` is a read-only mirror of the last commit.
//! 3. **Counters:** `cycle`/`instret` and their machine aliases read the free-running counters.

use super::Cpu;
use crate::common::Trap;
use crate::core::arch::WindowConfig;
use crate::core::arch::csr;
use crate::core::arch::mode::PrivilegeMode;

impl Cpu {
    /// Reads a Control and Status Register (CSR).
    ///
    /// # Errors
    ///
    /// `Trap::IllegalInstruction(addr)` when the current privilege is too low.
    pub fn csr_read(&self, addr: u32) -> Result<u64, Trap> {
        self.check_csr_privilege(addr)?;
        Ok(match addr {
            csr::WINDOW_STAGED => self.regs.staged().raw() as u64,
            csr::CYCLE | csr::MCYCLE => self.stats.cycles,
            csr::INSTRET | csr::MINSTRET => self.stats.instructions_retired,
            _ => self.csrs.read(addr),
        })
    }

    /// Writes a Control and Status Register (CSR).
    ///
    /// Writing the staging CSR records the next window without touching visible
    /// registers. Writes to the machine counters are ignored so they stay free-running.
    ///
    /// # Errors
    ///
    /// `Trap::IllegalInstruction(addr)` when the current privilege is too low or the
    /// CSR is read-only (including the active-window mirror).
    pub fn csr_write(&mut self, addr: u32, val: u64) -> Result<(), Trap> {
        self.check_csr_privilege(addr)?;
        if csr::is_read_only(addr) || addr == csr::WINDOW_ACTIVE {
            return Err(Trap::IllegalInstruction(addr));
        }
        match addr {
            csr::WINDOW_STAGED => {
                self.regs.stage(WindowConfig::from_raw(val as u32));
                self.stats.window_stages += 1;
            }
            csr::MCYCLE | csr::MINSTRET => {}
            _ => self.csrs.write(addr, val),
        }
        Ok(())
    }

    fn check_csr_privilege(&self, addr: u32) -> Result<(), Trap> {
        // 0x801 encodes user level; staging is M-mode only.
        let required = if addr == csr::WINDOW_STAGED {
            PrivilegeMode::Machine
        } else {
            PrivilegeMode::from_u8(csr::required_privilege(addr))
        };
        if self.privilege < required {
            Err(Trap::IllegalInstruction(addr))
        } else {
            Ok(())
        }
    }
}
