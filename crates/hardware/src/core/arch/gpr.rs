//! Windowed General-Purpose Register File.
//!
//! This module implements the windowed register bank extension. It performs the following:
//! 1. **Storage:** Owns one large physical bank; the architectural `x0`-`x31` are a slice of it.
//! 2. **Two-Phase Switching:** A window is first *staged*, then *committed* by the trap-return path.
//! 3. **Invariant Enforcement:** `x0` reads as zero in every window; accesses outside the
//!    active window and out-of-range windows are fatal.
//! 4. **Debugging:** Dumps the registers of the active window.

use tracing::{debug, trace, warn};

use super::window::WindowConfig;
use crate::common::constants::ARCH_REGS;

/// Windowed general-purpose register file.
///
/// Between [`stage`](Gpr::stage) and the commit performed by `mret`, the staged and
/// active windows are both observable and register accesses still go to the active one.
pub struct Gpr {
    bank: Vec<u64>,
    active: WindowConfig,
    staged: WindowConfig,
    commits: u64,
}

impl Gpr {
    /// Creates a register file backed by `capacity` physical registers, all zero,
    /// with the reset window both active and staged.
    pub fn new(capacity: usize) -> Self {
        assert!(
            WindowConfig::RESET.fits(capacity),
            "physical register bank of {capacity} cannot hold the reset window"
        );
        Self {
            bank: vec![0; capacity],
            active: WindowConfig::RESET,
            staged: WindowConfig::RESET,
            commits: 0,
        }
    }

    /// Number of physical registers in the bank.
    pub fn capacity(&self) -> usize {
        self.bank.len()
    }

    /// The window register accesses currently go to.
    pub fn active(&self) -> WindowConfig {
        self.active
    }

    /// The window the next trap return will commit.
    pub fn staged(&self) -> WindowConfig {
        self.staged
    }

    /// Number of commits performed since reset.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Records `cfg` as the pending window. Visible registers are untouched.
    ///
    /// A window that does not fit in the bank is a programming defect and aborts.
    pub fn stage(&mut self, cfg: WindowConfig) {
        assert!(
            cfg.fits(self.capacity()),
            "staged window {cfg} exceeds the physical bank of {} registers",
            self.capacity()
        );
        if self.staged != self.active {
            warn!(pending = %self.staged, staged = %cfg, "pending window replaced before commit");
        }
        self.staged = cfg;
        debug!(staged = %cfg, active = %self.active, "window staged");
        self.dump();
    }

    /// Makes the staged window active and returns it.
    ///
    /// Only the trap-return path may call this. Re-committing the window that is
    /// already active is legal and leaves the registers as they were.
    pub(crate) fn commit(&mut self) -> WindowConfig {
        let previous = self.active;
        self.active = self.staged;
        self.commits += 1;
        debug!(from = %previous, to = %self.active, "window committed");
        self.active
    }

    /// Reads architectural register `idx` through the active window.
    pub fn read(&self, idx: usize) -> u64 {
        if idx == 0 { 0 } else { self.bank[self.slot(idx)] }
    }

    /// Writes architectural register `idx` through the active window. Writes to `x0` are ignored.
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx != 0 {
            let slot = self.slot(idx);
            self.bank[slot] = val;
        }
    }

    /// Reads a physical register directly, bypassing the window.
    pub fn read_physical(&self, phys: usize) -> u64 {
        self.bank[phys]
    }

    /// The physical registers backing `cfg`.
    pub fn window_slice(&self, cfg: WindowConfig) -> &[u64] {
        assert!(cfg.fits(self.capacity()), "window {cfg} out of range");
        &self.bank[cfg.base()..cfg.end()]
    }

    /// Dumps the active window at trace level.
    pub fn dump(&self) {
        let regs = self.window_slice(self.active);
        for (i, pair) in regs.chunks(2).enumerate() {
            match pair {
                [a, b] => trace!(
                    "x{:<2}={:#018x} x{:<2}={:#018x}",
                    2 * i,
                    a,
                    2 * i + 1,
                    b
                ),
                [a] => trace!("x{:<2}={:#018x}", 2 * i, a),
                _ => {}
            }
        }
    }

    fn slot(&self, idx: usize) -> usize {
        assert!(idx < ARCH_REGS, "register x{idx} does not exist");
        assert!(
            idx < self.active.size(),
            "register x{idx} lies outside active window {}",
            self.active
        );
        self.active.base() + idx
    }
}

impl std::fmt::Debug for Gpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gpr")
            .field("capacity", &self.bank.len())
            .field("active", &self.active)
            .field("staged", &self.staged)
            .field("commits", &self.commits)
            .finish()
    }
}
