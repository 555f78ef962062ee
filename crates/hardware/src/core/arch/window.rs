//! Packed Register-Window Configuration.
//!
//! A window selects a contiguous slice of the physical register bank. Software
//! hands it to the hardware as a single 32-bit value packed as `(size << 16) | base`,
//! where both fields are register indices, not byte addresses.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::constants::{
    ARCH_REGS, RESET_WINDOW, WINDOW_FIELD_MASK, WINDOW_SIZE_SHIFT,
};

/// A packed `(size << 16) | base` window selection.
///
/// Serializes as the raw 32-bit value so configuration files can use the same
/// literals software writes to the staging CSR (e.g. `0x00200020` is `2097184`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct WindowConfig(u32);

impl WindowConfig {
    /// The window active after machine reset: base 0, size 32.
    pub const RESET: Self = Self(RESET_WINDOW);

    /// Packs a window from its base index and size.
    pub const fn new(base: u16, size: u16) -> Self {
        Self(((size as u32) << WINDOW_SIZE_SHIFT) | base as u32)
    }

    /// Wraps a raw packed value as written to the staging CSR.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw packed value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// First physical register index of the window.
    pub const fn base(self) -> usize {
        (self.0 & WINDOW_FIELD_MASK) as usize
    }

    /// Number of architectural registers the window exposes.
    pub const fn size(self) -> usize {
        ((self.0 >> WINDOW_SIZE_SHIFT) & WINDOW_FIELD_MASK) as usize
    }

    /// One past the last physical register index of the window.
    pub const fn end(self) -> usize {
        self.base() + self.size()
    }

    /// Whether the window fits in a physical bank of `capacity` registers.
    ///
    /// A window may expose at most the 32 architectural registers.
    pub const fn fits(self, capacity: usize) -> bool {
        self.size() <= ARCH_REGS && self.end() <= capacity
    }

    /// Whether two windows share any physical register.
    pub const fn overlaps(self, other: Self) -> bool {
        self.base() < other.end() && other.base() < self.end()
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::RESET
    }
}

impl From<u32> for WindowConfig {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<WindowConfig> for u32 {
    fn from(cfg: WindowConfig) -> Self {
        cfg.0
    }
}

impl fmt::Display for WindowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#010x} (base {}, size {})",
            self.0,
            self.base(),
            self.size()
        )
    }
}
