//! Modeled Instruction Execution.
//!
//! The hart does not decode instruction words; task bodies and trap glue drive it
//! through the few instructions the windowed-register mechanism depends on. Each
//! of them retires exactly one instruction and advances the PC, so instruction
//! spans measured with `instret` are deterministic.
//!
//! A `csrr` of a counter observes the count before the `csrr` itself retires.

use tracing::trace;

use super::Cpu;
use crate::common::Trap;
use crate::common::constants::INSTRUCTION_SIZE_32;
use crate::core::arch::mode::PrivilegeMode;
use crate::core::arch::window::WindowConfig;

impl Cpu {
    /// Counts `n` retired instructions without other architectural effect.
    pub fn retire(&mut self, n: u64) {
        self.stats.instructions_retired += n;
        self.stats.cycles += n;
        if self.trace {
            trace!(pc = format_args!("{:#x}", self.pc), n, "retire");
        }
    }

    fn retire_one(&mut self) {
        self.retire(1);
        self.pc = self.pc.wrapping_add(INSTRUCTION_SIZE_32);
    }

    /// `li rd, imm`.
    pub fn exec_li(&mut self, rd: usize, imm: u64) {
        self.regs.write(rd, imm);
        self.retire_one();
    }

    /// `count` instructions of opaque task work (loads, stores, ALU ops) that touch no modeled state.
    pub fn exec_work(&mut self, count: u64) {
        for _ in 0..count {
            self.retire_one();
        }
    }

    /// `csrr rd, addr`. Returns the value read.
    ///
    /// # Errors
    ///
    /// Propagates the illegal-instruction trap from a privileged CSR; nothing retires.
    pub fn exec_csrr(&mut self, rd: usize, addr: u32) -> Result<u64, Trap> {
        let val = self.csr_read(addr)?;
        self.regs.write(rd, val);
        self.retire_one();
        Ok(val)
    }

    /// `csrw addr, rs`.
    ///
    /// # Errors
    ///
    /// Propagates the illegal-instruction trap; nothing retires.
    pub fn exec_csrw(&mut self, addr: u32, rs: usize) -> Result<(), Trap> {
        let val = self.regs.read(rs);
        self.csr_write(addr, val)?;
        self.retire_one();
        Ok(())
    }

    /// `ecall`: traps to Machine mode with the environment-call cause for the current privilege.
    ///
    /// The `ecall` is counted as retired so a yield has a nonzero instruction cost.
    pub fn exec_ecall(&mut self) {
        let cause = match self.privilege {
            PrivilegeMode::User => Trap::EnvironmentCallFromUMode,
            PrivilegeMode::Supervisor => Trap::EnvironmentCallFromSMode,
            PrivilegeMode::Machine => Trap::EnvironmentCallFromMMode,
        };
        let epc = self.pc;
        self.retire(1);
        self.trap(cause, epc);
    }

    /// `mret`: returns from the trap and commits the staged window.
    ///
    /// # Errors
    ///
    /// `Trap::IllegalInstruction` below Machine mode; nothing retires or commits.
    pub fn exec_mret(&mut self) -> Result<WindowConfig, Trap> {
        let committed = self.do_mret()?;
        self.retire(1);
        Ok(committed)
    }
}
