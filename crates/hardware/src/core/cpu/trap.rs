//! Trap Handling Logic.
//!
//! This module implements trap entry and the `mret` return path. It performs the following:
//! 1. **Trap Entry:** Saves `mepc`/`mcause`/`mtval`, stacks the interrupt-enable and
//!    privilege state in `mstatus`, and enters Machine mode at `mtvec`.
//! 2. **Return Handling:** `mret` restores the saved state and is the single commit point
//!    for a staged register window.
//!
//! The commit happens after the new `mstatus` is computed but before privilege is
//! dropped: committing needs M-mode, and a resumed task must never see its
//! registers before its window is active.

use tracing::debug;

use super::Cpu;
use crate::common::Trap;
use crate::core::arch::csr;
use crate::core::arch::mode::PrivilegeMode;
use crate::core::arch::window::WindowConfig;

/// Encoding of the `mret` instruction, reported in `mtval` when it is illegal.
pub const MRET_INSTRUCTION: u32 = 0x3020_0073;

impl Cpu {
    /// Takes a trap into Machine mode.
    ///
    /// # Arguments
    ///
    /// * `cause` - The type of trap that occurred.
    /// * `epc` - The Exception Program Counter (PC where the trap occurred).
    pub fn trap(&mut self, cause: Trap, epc: u64) {
        debug!(%cause, epc = format_args!("{epc:#x}"), privilege = %self.privilege, "trap taken");

        self.csrs.mcause = cause.cause();
        self.csrs.mepc = epc & !1;
        self.csrs.mtval = cause.tval();

        let mut mstatus = self.csrs.mstatus;
        if (mstatus & csr::MSTATUS_MIE) != 0 {
            mstatus |= csr::MSTATUS_MPIE;
        } else {
            mstatus &= !csr::MSTATUS_MPIE;
        }
        mstatus &= !csr::MSTATUS_MPP;
        mstatus |= (self.privilege.to_u8() as u64) << csr::MSTATUS_MPP_SHIFT;
        mstatus &= !csr::MSTATUS_MIE;
        self.csrs.mstatus = mstatus;

        self.privilege = PrivilegeMode::Machine;
        self.pc = self.csrs.mtvec & !3;
        self.stats.traps_taken += 1;
    }

    /// Executes the `MRET` instruction (Return from Machine Mode).
    ///
    /// Order: jump target from `mepc`; new `mstatus` from the saved fields; window
    /// commit and CSR mirror update while still in M-mode; write `mstatus`; drop privilege.
    ///
    /// # Errors
    ///
    /// `Trap::IllegalInstruction` when executed below Machine mode. Nothing is
    /// committed in that case.
    pub(crate) fn do_mret(&mut self) -> Result<WindowConfig, Trap> {
        if self.privilege != PrivilegeMode::Machine {
            return Err(Trap::IllegalInstruction(MRET_INSTRUCTION));
        }

        self.pc = self.csrs.mepc & !1;

        let mut s = self.csrs.mstatus;
        let mpp = (s >> csr::MSTATUS_MPP_SHIFT) & csr::MSTATUS_MPP_MASK;
        let prev = PrivilegeMode::from_u8(mpp as u8);

        if prev != PrivilegeMode::Machine {
            s &= !csr::MSTATUS_MPRV;
        }
        if (s & csr::MSTATUS_MPIE) != 0 {
            s |= csr::MSTATUS_MIE;
        } else {
            s &= !csr::MSTATUS_MIE;
        }
        s |= csr::MSTATUS_MPIE;
        s &= !csr::MSTATUS_MPP;
        let least = if self.user_mode {
            PrivilegeMode::User
        } else {
            PrivilegeMode::Machine
        };
        s |= (least.to_u8() as u64) << csr::MSTATUS_MPP_SHIFT;

        let committed = self.commit_window();

        s &= !csr::MSTATUS_MDT;
        self.csrs.mstatus = s;
        self.privilege = prev;
        self.stats.trap_returns += 1;

        debug!(pc = format_args!("{:#x}", self.pc), privilege = %prev, window = %committed, "mret");
        Ok(committed)
    }

    /// Commits the staged window and refreshes the `0x800` mirror.
    fn commit_window(&mut self) -> WindowConfig {
        assert_eq!(
            self.privilege,
            PrivilegeMode::Machine,
            "window commit outside Machine mode"
        );
        let committed = self.regs.commit();
        self.csrs.window_active = committed.raw() as u64;
        self.stats.window_commits += 1;
        committed
    }
}
