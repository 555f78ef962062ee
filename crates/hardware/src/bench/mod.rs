//! Retired-instruction measurement protocol.
//!
//! Cost is measured by reading the free-running `minstret` counter before and
//! after a span of code. Reading the counter is itself an instruction: it
//! observes the count before it retires, so two back-to-back reads differ by one
//! and any span is strictly positive.

/// The benchmark scenarios run by the CLI.
pub mod scenarios;

use serde::Serialize;

use crate::common::Trap;
use crate::core::Cpu;
use crate::core::arch::csr;

/// A monotonic, software-readable retired-instruction counter.
pub trait InstructionCounter {
    /// Reads the counter (`csrr rd, minstret`).
    ///
    /// # Errors
    ///
    /// A trap if the counter is not readable at the current privilege.
    fn read_instret(&mut self) -> Result<u64, Trap>;
}

impl InstructionCounter for Cpu {
    fn read_instret(&mut self) -> Result<u64, Trap> {
        let val = self.csr_read(csr::MINSTRET)?;
        self.exec_work(1);
        Ok(val)
    }
}

/// Two counter readings bracketing a span of code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct InstretSpan {
    /// Reading taken at the start of the span.
    pub start: u64,
    /// Reading taken at the end of the span.
    pub end: u64,
}

impl InstretSpan {
    /// Builds a span from two readings. A counter that went backwards is a defect.
    pub fn new(start: u64, end: u64) -> Self {
        assert!(end >= start, "instret went backwards: {start} -> {end}");
        Self { start, end }
    }

    /// Instructions retired between the two readings, including the first read.
    pub const fn instructions(&self) -> u64 {
        self.end - self.start
    }
}

/// Reads the counter, runs `f`, reads the counter again.
///
/// # Errors
///
/// Any trap from the counter reads or from `f`.
pub fn measure<C, T, F>(counter: &mut C, f: F) -> Result<(T, InstretSpan), Trap>
where
    C: InstructionCounter,
    F: FnOnce(&mut C) -> Result<T, Trap>,
{
    let start = counter.read_instret()?;
    let out = f(counter)?;
    let end = counter.read_instret()?;
    Ok((out, InstretSpan::new(start, end)))
}
