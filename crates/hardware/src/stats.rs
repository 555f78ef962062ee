//! Simulation statistics collection and reporting.
//!
//! This module tracks the counters of the windowed hart. It provides:
//! 1. **Retirement:** Total cycles and retired instructions (the `instret` counter).
//! 2. **Control flow:** Traps taken and trap returns executed.
//! 3. **Windows:** Stage writes, commits, and completed context switches.

use std::time::Instant;

use serde::Serialize;

/// Simulation statistics structure.
///
/// `instructions_retired` backs the `instret`/`minstret` CSRs and only ever grows.
#[derive(Clone, Debug, Serialize)]
pub struct SimStats {
    #[serde(skip)]
    start_time: Instant,
    /// Total simulator cycles elapsed (one per retired instruction).
    pub cycles: u64,
    /// Number of instructions retired.
    pub instructions_retired: u64,
    /// Number of traps taken.
    pub traps_taken: u64,
    /// Number of `mret` instructions executed.
    pub trap_returns: u64,
    /// Number of writes to the staging CSR.
    pub window_stages: u64,
    /// Number of window commits.
    pub window_commits: u64,
    /// Number of scheduler invocations that handed the hart to another task.
    pub context_switches: u64,
    /// Number of tasks entered through the bootstrap stub.
    pub bootstraps: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            traps_taken: 0,
            trap_returns: 0,
            window_stages: 0,
            window_commits: 0,
            context_switches: 0,
            bootstraps: 0,
        }
    }
}

impl SimStats {
    /// Average retired instructions per context switch, or 0 before the first switch.
    pub fn instructions_per_switch(&self) -> u64 {
        self.instructions_retired
            .checked_div(self.context_switches)
            .unwrap_or(0)
    }

    /// Prints all statistics to stdout.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        println!("\n==========================================================");
        println!("WINDOWED REGISTER BANK STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {seconds:.4} s");
        println!("sim_cycles               {}", self.cycles);
        println!("sim_insts                {}", self.instructions_retired);
        println!("----------------------------------------------------------");
        println!("CONTROL FLOW");
        println!("  traps.taken            {}", self.traps_taken);
        println!("  traps.returns          {}", self.trap_returns);
        println!("----------------------------------------------------------");
        println!("WINDOWS");
        println!("  window.stages          {}", self.window_stages);
        println!("  window.commits         {}", self.window_commits);
        println!("  sched.switches         {}", self.context_switches);
        println!("  sched.bootstraps       {}", self.bootstraps);
        println!("  sched.insts_per_switch {}", self.instructions_per_switch());
        println!("==========================================================");
    }
}
